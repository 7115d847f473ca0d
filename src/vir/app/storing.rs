//! Mailbox store collaborator
//!
//! A Mailboxer persists store and forward messages per topic. The topic
//! encoding is the UTF-8 of "{recipient}/{topic}".

use crate::vir::VIRError;
use indexmap::IndexMap;
use std::cell::RefCell;

/// Store and forward message storage keyed by topic
pub trait Mailboxer {
    /// Appends msg under topic
    fn store_msg(&self, topic: &[u8], msg: &[u8]) -> Result<(), VIRError>;
}

/// In process mailbox store keeping messages per topic in append order
pub struct MemoryMailboxer {
    msgs: RefCell<IndexMap<Vec<u8>, Vec<Vec<u8>>>>,
}

impl MemoryMailboxer {
    pub fn new() -> Self {
        Self {
            msgs: RefCell::new(IndexMap::new()),
        }
    }

    /// Returns messages stored under topic in append order
    pub fn get_msgs(&self, topic: &[u8]) -> Vec<Vec<u8>> {
        self.msgs
            .borrow()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns all topics with stored messages
    pub fn topics(&self) -> Vec<Vec<u8>> {
        self.msgs.borrow().keys().cloned().collect()
    }
}

impl Default for MemoryMailboxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailboxer for MemoryMailboxer {
    fn store_msg(&self, topic: &[u8], msg: &[u8]) -> Result<(), VIRError> {
        self.msgs
            .borrow_mut()
            .entry(topic.to_vec())
            .or_default()
            .push(msg.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_mailboxer() {
        let mbx = MemoryMailboxer::new();
        mbx.store_msg(b"Erecp/replay", b"one").unwrap();
        mbx.store_msg(b"Erecp/replay", b"two").unwrap();

        assert_eq!(
            mbx.get_msgs(b"Erecp/replay"),
            vec![b"one".to_vec(), b"two".to_vec()]
        );
        assert_eq!(mbx.topics(), vec![b"Erecp/replay".to_vec()]);
        assert!(mbx.get_msgs(b"Eother/replay").is_empty());
    }
}
