use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set once the user presses Ctrl-C; the batch checks it between hours and
/// between chunks of a download.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes SIGINT into the returned flag instead of killing the process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let cancellation = Self::new();
        let handler_flag = cancellation.clone();
        ctrlc::set_handler(move || handler_flag.cancel())?;
        Ok(cancellation)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let cancellation = Cancellation::new();
        let clone = cancellation.clone();
        assert!(!clone.is_cancelled());
        cancellation.cancel();
        assert!(clone.is_cancelled());
    }
}
