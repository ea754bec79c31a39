// Single-threaded event loop
// Every gesture and media notification goes through one FIFO queue and is
// dispatched to completion before the next one is looked at.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::media::{MediaElement, MediaEventSink, MediaListener};
use crate::player::controller::AudioPlayerController;
use crate::player::messages::{Gesture, HostEvent};
use crate::player::state::PlaybackViewState;
use crate::player::view::PlayerView;

/// Posting side of the event queue
#[derive(Debug, Clone)]
pub struct HostSender(UnboundedSender<HostEvent>);

impl HostSender {
    pub fn post(&self, event: impl Into<HostEvent>) {
        if self.0.send(event.into()).is_err() {
            log::debug!("Event loop is gone; dropping event");
        }
    }

    /// Sink that media elements emit into
    pub fn media_sink(&self) -> MediaEventSink {
        let tx = self.0.clone();
        MediaEventSink::new(move |event| {
            let _ = tx.send(HostEvent::Media(event));
        })
    }
}

/// Unmounted event queue; hand out senders, then build the loop
#[derive(Debug)]
pub struct EventQueue {
    tx: UnboundedSender<HostEvent>,
    rx: UnboundedReceiver<HostEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> HostSender {
        HostSender(self.tx.clone())
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Told about the view after every dispatched event
pub trait PlayerObserver {
    fn on_update(&mut self, view: &PlayerView, state: &PlaybackViewState);
}

pub struct EventLoop<M: MediaElement> {
    controller: AudioPlayerController<M>,
    queue: EventQueue,
    observers: Vec<Box<dyn PlayerObserver>>,
}

impl<M: MediaElement> EventLoop<M> {
    pub fn new(controller: AudioPlayerController<M>, queue: EventQueue) -> Self {
        Self {
            controller,
            queue,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn PlayerObserver>) {
        self.observers.push(observer);
    }

    pub fn sender(&self) -> HostSender {
        self.queue.sender()
    }

    pub fn controller(&self) -> &AudioPlayerController<M> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AudioPlayerController<M> {
        &mut self.controller
    }

    /// Queue a gesture behind whatever is already pending
    pub fn gesture(&self, gesture: Gesture) {
        self.sender().post(gesture);
    }

    /// Handle one event. Returns `false` on shutdown.
    pub fn dispatch(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::Media(event) => self.controller.on_media_event(&event),
            HostEvent::Gesture(gesture) => self.controller.handle_gesture(gesture),
            HostEvent::Notice(message) => self.controller.on_notice(message),
            HostEvent::Shutdown => return false,
        }

        if !self.observers.is_empty() {
            let state = self.controller.state();
            for observer in &mut self.observers {
                observer.on_update(self.controller.view(), &state);
            }
        }
        true
    }

    /// Drain everything already queued, including events those events cause.
    /// Returns how many events were handled.
    pub fn run_until_idle(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.queue.rx.try_recv() {
            handled += 1;
            if !self.dispatch(event) {
                break;
            }
        }
        handled
    }

    /// Wait for the next event and handle it. Returns `false` on shutdown.
    pub async fn next(&mut self) -> bool {
        match self.queue.rx.recv().await {
            Some(event) => self.dispatch(event),
            None => false,
        }
    }

    /// Run until a shutdown event arrives
    pub async fn run(&mut self) {
        while self.next().await {}
        log::info!("Event loop stopped");
    }
}
