use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::sleep,
};

use super::SessionSignal;

/// A pending scheduled transition. Cancelling (or dropping) the handle stops
/// the signal from firing, so superseded transitions never arrive late.
pub struct TimerHandle {
    handle: JoinHandle<()>,
}

impl TimerHandle {
    pub fn schedule(
        delay: Duration,
        signal: SessionSignal,
        sender: UnboundedSender<SessionSignal>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = sender.send(signal);
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
