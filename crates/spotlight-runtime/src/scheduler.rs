#![forbid(unsafe_code)]

//! Next-frame scheduling.
//!
//! The scroller never blocks; it asks a [`FrameScheduler`] to call it back on
//! the next frame. Hosts implement the trait on top of their render loop.
//! [`FrameQueue`] is a manual implementation for hosts that pump frames
//! themselves, and for tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Work deferred to the next frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Abstract "run this on the next frame" primitive.
pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback);
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for Rc<S> {
    fn request_frame(&self, callback: FrameCallback) {
        (**self).request_frame(callback)
    }
}

/// Manually pumped frame queue.
///
/// Callbacks requested while a frame runs are deferred to the following frame.
#[derive(Default)]
pub struct FrameQueue {
    callbacks: RefCell<VecDeque<FrameCallback>>,
    frame: Cell<u64>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback requested before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<FrameCallback> = self.callbacks.borrow_mut().drain(..).collect();
        self.frame.set(self.frame.get() + 1);
        let ran = batch.len();
        for callback in batch {
            callback();
        }
        ran
    }

    /// Run frames until nothing is pending or `max_frames` ran.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending() > 0 {
            self.run_frame();
            frames += 1;
        }
        frames
    }

    /// Callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame.get()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, callback: FrameCallback) {
        self.callbacks.borrow_mut().push_back(callback);
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.pending())
            .field("frame", &self.frame())
            .finish()
    }
}
