//! Messenger collaborator
//!
//! Delivery transports live behind the Messenger trait: the Poster
//! enqueues outbound bytes on a messenger's msgs deck, services it
//! cooperatively until it reports idle, then tears it down. Transport
//! construction is behind MessengerFactory so HTTP or TCP transports
//! plug in from outside the core.

use crate::hio::decking::Deck;
use crate::vir::VIRError;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Cooperative outbound transport for one endpoint provider
pub trait Messenger {
    /// Outbound byte buffers awaiting transmission
    fn msgs(&self) -> &Deck<Vec<u8>>;

    /// True when all enqueued buffers have drained
    fn idle(&self) -> bool;

    /// Advances transmission by one unit of work
    fn service(&mut self) -> Result<(), VIRError>;
}

/// Constructs messengers for (sender prefix, endpoint id, urls)
pub trait MessengerFactory {
    /// Returns a messenger targeted at eid via urls, scheme to url.
    /// Fails with ConfigurationError when no usable scheme is present.
    fn messenger_from(
        &self,
        hab_pre: &str,
        eid: &str,
        urls: &IndexMap<String, String>,
    ) -> Result<Box<dyn Messenger>, VIRError>;
}

/// A delivered buffer record: (endpoint id, url, bytes)
pub type Sent = (String, String, Vec<u8>);

/// BufferMessenger drains its queue into a shared sink, one buffer per
/// service step. Stands in for a wire transport in process local use and
/// in tests.
pub struct BufferMessenger {
    eid: String,
    url: String,
    msgs: Deck<Vec<u8>>,
    sink: Rc<RefCell<Vec<Sent>>>,
}

impl Messenger for BufferMessenger {
    fn msgs(&self) -> &Deck<Vec<u8>> {
        &self.msgs
    }

    fn idle(&self) -> bool {
        self.msgs.is_empty()
    }

    fn service(&mut self) -> Result<(), VIRError> {
        if let Some(msg) = self.msgs.pull() {
            self.sink
                .borrow_mut()
                .push((self.eid.clone(), self.url.clone(), msg));
        }
        Ok(())
    }
}

/// Factory for BufferMessenger instances sharing one sink
pub struct BufferMessengerFactory {
    sink: Rc<RefCell<Vec<Sent>>>,
}

impl BufferMessengerFactory {
    pub fn new() -> Self {
        Self {
            sink: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Shared sink of delivered buffers
    pub fn sink(&self) -> Rc<RefCell<Vec<Sent>>> {
        self.sink.clone()
    }
}

impl Default for BufferMessengerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessengerFactory for BufferMessengerFactory {
    fn messenger_from(
        &self,
        _hab_pre: &str,
        eid: &str,
        urls: &IndexMap<String, String>,
    ) -> Result<Box<dyn Messenger>, VIRError> {
        let (_, url) = urls.first().ok_or_else(|| {
            VIRError::ConfigurationError(format!("No url for endpoint={}", eid))
        })?;
        Ok(Box::new(BufferMessenger {
            eid: eid.to_string(),
            url: url.clone(),
            msgs: Deck::new(),
            sink: self.sink.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_messenger_drains_to_sink() {
        let factory = BufferMessengerFactory::new();
        let mut urls = IndexMap::new();
        urls.insert("http".to_string(), "http://w/".to_string());
        let mut witer = factory
            .messenger_from("Epre", "Beid", &urls)
            .unwrap();

        assert!(witer.idle());
        witer.msgs().push(b"payload".to_vec());
        assert!(!witer.idle());
        witer.service().unwrap();
        assert!(witer.idle());

        let sink = factory.sink();
        let sent = sink.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Beid");
        assert_eq!(sent[0].1, "http://w/");
        assert_eq!(sent[0].2, b"payload".to_vec());
    }

    #[test]
    fn test_factory_requires_url() {
        let factory = BufferMessengerFactory::new();
        let result = factory.messenger_from("Epre", "Beid", &IndexMap::new());
        match result {
            Err(err) => assert!(matches!(err, VIRError::ConfigurationError(_))),
            Ok(_) => panic!("expected an error"),
        }
    }
}
