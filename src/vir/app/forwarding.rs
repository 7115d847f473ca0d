//! Store and forward enveloping and delivery
//!
//! The Poster wraps any signed event in a /fwd exn envelope and delivers
//! it to one of the recipient's endpoints: directly for controller and
//! agent roles, via store and forward for mailbox and witness roles. The
//! ForwardHandler is the receiving side, unwrapping envelopes into a
//! local mailbox.

use crate::cesr::counting::{ctr_dex_1_0, BaseCounter, Counter};
use crate::cesr::pather::Pather;
use crate::cesr::prefixer::Prefixer;
use crate::cesr::Matter;
use crate::hio::decking::Deck;
use crate::hio::doing::{Doer, Status};
use crate::vir::app::agenting::{Messenger, MessengerFactory};
use crate::vir::app::exchanging::exchange;
use crate::vir::app::habbing::Habitat;
use crate::vir::app::storing::Mailboxer;
use crate::vir::core::serdering::Serder;
use crate::vir::db::dbing::keys::dg_key;
use crate::vir::{Roles, VIRError};
use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use serde_json::{json, Value};
use std::rc::Rc;
use std::str::FromStr;
use tracing::{error, info};

/// Endpoint map for one recipient: role to endpoint id to scheme to url
pub type Ends = IndexMap<Roles, IndexMap<String, IndexMap<String, String>>>;

/// Inbound delivery request
pub struct PostEvent {
    pub src: String,
    pub dest: String,
    pub topic: String,
    pub serder: Serder,
    pub attachment: Option<Vec<u8>>,
    pub hab: Option<Rc<dyn Habitat>>,
}

/// Outbound acknowledgement appended after a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub dest: String,
    pub topic: String,
    pub said: String,
}

/// Endpoint selection policy. Uniform over the candidate set by default;
/// tests substitute a deterministic picker.
pub trait Picker {
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniformly random selection
pub struct RandomPicker;

impl Picker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always selects the first candidate
pub struct FirstPicker;

impl Picker for FirstPicker {
    fn pick(&mut self, _len: usize) -> usize {
        0
    }
}

/// Poster wraps any signed event in a /fwd exn envelope and delivers it
/// to one of the target recipient's endpoints for store and forward to
/// the intended recipient
pub struct Poster {
    habs: IndexMap<String, Rc<dyn Habitat>>,
    mbx: Option<Rc<dyn Mailboxer>>,
    factory: Box<dyn MessengerFactory>,
    picker: Box<dyn Picker>,
    evts: Deck<PostEvent>,
    cues: Deck<Cue>,
    inflight: Option<(Box<dyn Messenger>, Cue)>,
    terminated: bool,
}

impl Poster {
    pub fn new(factory: Box<dyn MessengerFactory>) -> Self {
        Self {
            habs: IndexMap::new(),
            mbx: None,
            factory,
            picker: Box::new(RandomPicker),
            evts: Deck::new(),
            cues: Deck::new(),
            inflight: None,
            terminated: false,
        }
    }

    /// Registers a sender habitat by its prefix
    pub fn add_hab(&mut self, hab: Rc<dyn Habitat>) {
        self.habs.insert(hab.pre().to_string(), hab);
    }

    /// Sets the local mailbox store for the short circuit path
    pub fn set_mbx(&mut self, mbx: Rc<dyn Mailboxer>) {
        self.mbx = Some(mbx);
    }

    /// Substitutes the endpoint selection policy
    pub fn set_picker(&mut self, picker: Box<dyn Picker>) {
        self.picker = picker;
    }

    /// Shared inbound request queue
    pub fn evts(&self) -> Deck<PostEvent> {
        self.evts.clone()
    }

    /// Shared outbound acknowledgement queue
    pub fn cues(&self) -> Deck<Cue> {
        self.cues.clone()
    }

    /// Queues a msg for enveloping and forwarding to the recipient dest
    pub fn send(
        &self,
        dest: &str,
        topic: &str,
        serder: Serder,
        src: Option<&str>,
        hab: Option<Rc<dyn Habitat>>,
        attachment: Option<Vec<u8>>,
    ) -> Result<(), VIRError> {
        let src = match src {
            Some(src) => src.to_string(),
            None => hab
                .as_ref()
                .map(|h| h.pre().to_string())
                .ok_or_else(|| VIRError::ValueError("send requires src or hab".to_string()))?,
        };
        self.evts.push(PostEvent {
            src,
            dest: dest.to_string(),
            topic: topic.to_string(),
            serder,
            attachment,
            hab,
        });
        Ok(())
    }

    /// Queues one first seen event for delivery to the habitat's
    /// delegator and returns a waiter that completes when the matching
    /// cue is observed.
    ///
    /// The local mailbox short circuit in forward appends no cue, so a
    /// waiter in that configuration never completes.
    pub fn send_event(&self, hab: Rc<dyn Habitat>, fn_ord: u64) -> Result<SendEvent, VIRError> {
        let icp = hab.clone_evt_msg(hab.pre(), fn_ord)?;
        let ser = Serder::from_raw(&icp)?;
        let atc = icp[ser.size()..].to_vec();

        // for a group habitat the managing member is the sender
        let sender = hab.mhab_pre().unwrap_or_else(|| hab.pre().to_string());
        let dest = hab.delegator().ok_or_else(|| {
            VIRError::ConfigurationError(format!("No delegator for pre={}", hab.pre()))
        })?;
        let said = ser.said().unwrap_or_default().to_string();
        let atc = if atc.is_empty() { None } else { Some(atc) };
        self.send(&dest, "delegate", ser, Some(&sender), None, atc)?;
        Ok(SendEvent {
            cues: self.cues.clone(),
            said,
        })
    }

    /// Builds the endpoint map for dest as seen by hab: every end role
    /// authorization keyed by dest grouped by role and endpoint id, with
    /// the witness role overlaid from dest's current key state. The
    /// witness key is always present even when empty.
    pub fn ends_for(hab: &dyn Habitat, dest: &str) -> Ends {
        let mut ends: Ends = IndexMap::new();
        for (ekey, _end) in hab.ends_item_iter(dest) {
            let role = match Roles::from_str(&ekey.role) {
                Ok(role) => role,
                Err(_) => continue,
            };
            let mut locs = IndexMap::new();
            for (scheme, url) in hab.fetch_urls(&ekey.eid).firsts() {
                locs.insert(scheme, url);
            }
            ends.entry(role).or_default().insert(ekey.eid.clone(), locs);
        }

        ends.entry(Roles::Witness).or_default();
        if let Some(kever) = hab.kevers(dest) {
            // latest key state for dest
            for eid in &kever.wits {
                let mut locs = IndexMap::new();
                for (scheme, url) in hab.fetch_urls(eid).firsts() {
                    locs.insert(scheme, url);
                }
                ends.entry(Roles::Witness)
                    .or_default()
                    .insert(eid.clone(), locs);
            }
        }
        ends
    }

    // Dispatches one request. Returns the in flight messenger when a
    // remote dispatch started, None when the request was consumed
    // without one (no roles, local mailbox store, or configuration
    // error).
    fn deliver(&mut self, evt: PostEvent) -> Result<Option<(Box<dyn Messenger>, Cue)>, VIRError> {
        let hab = match evt.hab.clone().or_else(|| self.habs.get(&evt.src).cloned()) {
            Some(hab) => hab,
            None => {
                error!("No sender habitat for src={}", evt.src);
                return Ok(None);
            }
        };
        let ends = Self::ends_for(hab.as_ref(), &evt.dest);
        let cue = Cue {
            dest: evt.dest.clone(),
            topic: evt.topic.clone(),
            said: evt.serder.said().unwrap_or_default().to_string(),
        };

        let role = [Roles::Controller, Roles::Agent, Roles::Mailbox, Roles::Witness]
            .into_iter()
            .find(|role| ends.get(role).is_some_and(|eids| !eids.is_empty()));
        let outcome = match role {
            None => {
                info!("No end roles for {} to send evt", evt.dest);
                return Ok(None);
            }
            Some(role @ (Roles::Controller | Roles::Agent)) => {
                let eids = &ends[&role];
                self.send_direct(hab.as_ref(), eids, &evt.serder, evt.attachment.as_deref())
            }
            Some(role) => {
                let eids = &ends[&role];
                self.forward(
                    hab.as_ref(),
                    eids,
                    &evt.dest,
                    &evt.serder,
                    evt.attachment.as_deref(),
                    &evt.topic,
                )
            }
        };

        match outcome {
            Ok(Some(witer)) => Ok(Some((witer, cue))),
            Ok(None) => Ok(None),
            Err(VIRError::ConfigurationError(err)) => {
                error!("Error sending to {} with ends={:?}. Err={}", evt.dest, ends, err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    // Direct delivery to a controller or agent endpoint
    fn send_direct(
        &mut self,
        hab: &dyn Habitat,
        ends: &IndexMap<String, IndexMap<String, String>>,
        serder: &Serder,
        atc: Option<&[u8]>,
    ) -> Result<Option<Box<dyn Messenger>>, VIRError> {
        let idx = self.picker.pick(ends.len());
        let (ctrl, locs) = ends
            .get_index(idx)
            .ok_or_else(|| VIRError::ConfigurationError("Empty endpoint set".to_string()))?;
        let witer = self.factory.messenger_from(hab.pre(), ctrl, locs)?;

        let mut msg = serder.raw().to_vec();
        if let Some(atc) = atc {
            msg.extend_from_slice(atc);
        }
        witer.msgs().push(msg);
        Ok(Some(witer))
    }

    // Store and forward via a mailbox or witness endpoint
    fn forward(
        &mut self,
        hab: &dyn Habitat,
        ends: &IndexMap<String, IndexMap<String, String>>,
        recp: &str,
        serder: &Serder,
        atc: Option<&[u8]>,
        topic: &str,
    ) -> Result<Option<Box<dyn Messenger>>, VIRError> {
        // if we are one of the mailboxes, just store locally
        if let Some(mbx) = &self.mbx {
            let owits: IndexSet<String> = ends.keys().cloned().collect();
            if owits.intersection(&hab.prefixes()).next().is_some() {
                let mut msg = serder.raw().to_vec();
                if let Some(atc) = atc {
                    msg.extend_from_slice(atc);
                }
                mbx.store_msg(format!("{}/{}", recp, topic).as_bytes(), &msg)?;
                return Ok(None);
            }
        }

        // not us, select a mailbox and forward it on
        let idx = self.picker.pick(ends.len());
        let (mbx, mailbox) = ends
            .get_index(idx)
            .ok_or_else(|| VIRError::ConfigurationError("Empty endpoint set".to_string()))?;

        let mut msg = introduce(hab, mbx)?;

        // create the forward message with payload embedded at the a field
        let fwd = exchange(
            "/fwd",
            json!({"pre": recp, "topic": topic}),
            serder.ked().clone(),
            None,
        )?;
        let mut ims = hab.endorse(&fwd, true, false)?;

        // transpose the attachments to point to the new location
        if let Some(atc) = atc {
            let mut pathed = Pather::new(&["a"])?.qb64b();
            pathed.extend_from_slice(atc);
            if pathed.len() % 4 != 0 {
                return Err(VIRError::FramingError(format!(
                    "Invalid attachments size={}, nonintegral quadlets",
                    pathed.len()
                )));
            }
            ims.extend(
                BaseCounter::new(ctr_dex_1_0::PATHED_MATERIAL_GROUP, (pathed.len() / 4) as u64)?
                    .qb64b(),
            );
            ims.extend(pathed);
        }

        let witer = self.factory.messenger_from(hab.pre(), mbx, mailbox)?;
        msg.extend(ims);
        witer.msgs().push(msg);
        Ok(Some(witer))
    }
}

impl Doer for Poster {
    type Error = VIRError;

    /// One pass per tick: service the in flight messenger, cueing on
    /// idle, else dispatch one queued request
    fn step(&mut self) -> Result<Status, VIRError> {
        if self.terminated {
            self.evts.clear();
            return Ok(Status::Done);
        }

        if let Some((mut witer, cue)) = self.inflight.take() {
            witer.service()?;
            if witer.idle() {
                self.cues.push(cue);
            } else {
                self.inflight = Some((witer, cue));
            }
            return Ok(Status::Pending);
        }

        if let Some(evt) = self.evts.pull() {
            self.inflight = self.deliver(evt)?;
        }
        Ok(Status::Pending)
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}

/// Waiter for the cue matching one sent event. Unmatched cues are
/// replaced onto the queue.
pub struct SendEvent {
    cues: Deck<Cue>,
    said: String,
}

impl SendEvent {
    pub fn said(&self) -> &str {
        &self.said
    }
}

impl Doer for SendEvent {
    type Error = VIRError;

    fn step(&mut self) -> Result<Status, VIRError> {
        if let Some(cue) = self.cues.pull() {
            if cue.said == self.said {
                return Ok(Status::Done);
            }
            self.cues.push(cue);
        }
        Ok(Status::Pending)
    }
}

/// Clones and returns hab's KEL when its latest event has not been
/// receipted by wit, else returns empty.
///
/// A wit already in hab's own witness set needs no introduction. For a
/// transferable wit the transferable receipt quadruples are consulted,
/// else the nontransferable receipt couples. Without a receipt the
/// cloned KEL is emitted followed by a signed end role reply for hab's
/// own prefix.
pub fn introduce(hab: &dyn Habitat, wit: &str) -> Result<Vec<u8>, VIRError> {
    let mut msgs = Vec::new();
    if hab.kever().wits.contains(&wit.to_string()) {
        return Ok(msgs);
    }

    let iserder_said = hab.kever().serder.said().unwrap_or_default().to_string();
    let dgkey = dg_key(wit.as_bytes(), iserder_said.as_bytes());
    let wit_prefixer = Prefixer::from_qb64(wit)?;
    let mut found = false;
    if wit_prefixer.is_transferable() {
        // find if we have a vrc from the other pre for own inception
        for quadruple in hab.vrcs(&dgkey)? {
            if String::from_utf8_lossy(&quadruple).starts_with(hab.pre()) {
                found = true;
            }
        }
    } else {
        // find if already receipts of own inception
        for couple in hab.rcts(&dgkey)? {
            if String::from_utf8_lossy(&couple).starts_with(hab.pre()) {
                found = true;
            }
        }
    }

    if !found {
        // no receipt from the remote so send own inception
        for msg in hab.clone_pre_iter()? {
            msgs.extend(msg);
        }
        msgs.extend(hab.reply_end_role(hab.pre())?);
    }
    Ok(msgs)
}

/// Parsed exn message as handed to a handler: the payload field map, the
/// query modifiers, and the path qualified attachments
pub struct ExnMessage {
    pub payload: Value,
    pub modifiers: Value,
    pub attachments: Vec<(Pather, Vec<u8>)>,
}

/// Handler for /fwd exn messages used to envelope other messages
/// intended for another recipient. Acts as a mailbox for other
/// identifiers, storing the unwrapped messages in a local store.
pub struct ForwardHandler {
    mbx: Rc<dyn Mailboxer>,
    msgs: Deck<ExnMessage>,
    terminated: bool,
}

impl ForwardHandler {
    /// Route this handler consumes
    pub const RESOURCE: &'static str = "/fwd";

    pub fn new(mbx: Rc<dyn Mailboxer>) -> Self {
        Self {
            mbx,
            msgs: Deck::new(),
            terminated: false,
        }
    }

    /// Shared inbound message queue
    pub fn msgs(&self) -> Deck<ExnMessage> {
        self.msgs.clone()
    }

    // Unwraps one envelope: each path qualified attachment is resolved
    // against the payload to recover the inner event dict, which is
    // re-serialized canonically as JSON and stored with its attachment
    // under "{recipient}/{topic}".
    fn handle(&self, msg: ExnMessage) -> Result<(), VIRError> {
        let recipient = msg
            .modifiers
            .get("pre")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let topic = msg
            .modifiers
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let resource = format!("{}/{}", recipient, topic);

        let mut pevt = Vec::new();
        for (pather, atc) in &msg.attachments {
            let ked = pather.resolve(&msg.payload)?;
            let raw = serde_json::to_vec(ked)
                .map_err(|e| VIRError::DeserializeError(format!("JSON serialize: {}", e)))?;
            pevt.extend(raw);
            pevt.extend_from_slice(atc);
        }

        if pevt.is_empty() {
            error!("error with message, nothing to forward");
            return Ok(());
        }
        self.mbx.store_msg(resource.as_bytes(), &pevt)
    }
}

impl Doer for ForwardHandler {
    type Error = VIRError;

    fn step(&mut self) -> Result<Status, VIRError> {
        if self.terminated {
            self.msgs.clear();
            return Ok(Status::Done);
        }
        if let Some(msg) = self.msgs.pull() {
            self.handle(msg)?;
        }
        Ok(Status::Pending)
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}
