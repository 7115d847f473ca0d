/// Result of advancing a cooperative task by one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Task has more work and yields control back to the scheduler
    Pending,
    /// Task has completed and may be removed from the schedule
    Done,
}

/// A cooperative task. A step is the only suspension point; there is no
/// preemption and no blocking I/O inside a step.
pub trait Doer {
    type Error;

    /// Advances the task by one unit of work
    fn step(&mut self) -> Result<Status, Self::Error>;

    /// Requests cooperative termination, observed on the next step
    fn terminate(&mut self) {}
}

/// Doist drives a set of doers in round robin order
pub struct Doist<E> {
    doers: Vec<Box<dyn Doer<Error = E>>>,
}

impl<E> Doist<E> {
    /// Creates a new empty Doist
    pub fn new() -> Self {
        Self { doers: Vec::new() }
    }

    /// Adds a doer to the schedule
    pub fn extend(&mut self, doer: Box<dyn Doer<Error = E>>) {
        self.doers.push(doer);
    }

    /// Returns the number of scheduled doers
    pub fn len(&self) -> usize {
        self.doers.len()
    }

    /// Returns true when no doers remain
    pub fn is_empty(&self) -> bool {
        self.doers.is_empty()
    }

    /// Advances every doer one step, dropping completed doers.
    /// Returns true while any doer remains scheduled.
    pub fn once(&mut self) -> Result<bool, E> {
        let mut remaining = Vec::with_capacity(self.doers.len());
        for mut doer in self.doers.drain(..) {
            match doer.step()? {
                Status::Pending => remaining.push(doer),
                Status::Done => {}
            }
        }
        self.doers = remaining;
        Ok(!self.doers.is_empty())
    }

    /// Runs until all doers complete or limit steps elapse
    pub fn run(&mut self, limit: usize) -> Result<(), E> {
        for _ in 0..limit {
            if !self.once()? {
                break;
            }
        }
        Ok(())
    }

    /// Requests cooperative termination of every scheduled doer
    pub fn terminate(&mut self) {
        for doer in &mut self.doers {
            doer.terminate();
        }
    }
}

impl<E> Default for Doist<E> {
    fn default() -> Self {
        Self::new()
    }
}
