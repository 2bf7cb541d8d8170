//! Evdev touchscreen backend.

use std::error::Error;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Duration;
use std::{mem, ptr};

use calloop::generic::Generic;
use calloop::signals::{Signal, Signals};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, Interest, LoopHandle, Mode, PostAction, RegistrationToken};
use tracing::{error, info};

use crate::config::GestureDefinition;
use crate::detector::Detector;
use crate::input::InputEvent;
use crate::trace_error;

/// reMarkable 2 touchscreen device.
pub const TOUCH_DEVICE: &str = "/dev/input/event2";

/// Size of a raw kernel input event.
const EVENT_SIZE: usize = mem::size_of::<libc::input_event>();

/// Run the gesture detector until the touch device is closed.
pub fn run(device_path: &Path, gestures: Vec<GestureDefinition>) -> Result<(), Box<dyn Error>> {
    let device = open(device_path)
        .map_err(|err| format!("Failed to open touch device {device_path:?}: {err}"))?;
    info!("Touch device: {}", device_path.display());

    let mut event_loop = EventLoop::try_new()?;
    let mut state = State::new(event_loop.handle(), Detector::new(gestures));

    // Collect exit status of launched commands.
    let signals = Signals::new(&[Signal::SIGCHLD])?;
    event_loop
        .handle()
        .insert_source(signals, |_, _, state| state.detector.reap())
        .map_err(|err| err.error)?;

    // Handle touch input.
    let source = Generic::new(device, Interest::READ, Mode::Level);
    let device_token = event_loop
        .handle()
        .insert_source(source, |_, device, state| Ok(state.handle_readiness(device.as_ref())))
        .map_err(|err| err.error)?;
    state.device_token = Some(device_token);

    info!("Waiting for gestures");

    // Continously dispatch event loop.
    while !state.terminated {
        event_loop.dispatch(None, &mut state)?;
    }

    Ok(())
}

/// Open a touch device for non-blocking reads.
pub fn open(path: &Path) -> io::Result<File> {
    File::options().read(true).custom_flags(libc::O_NONBLOCK).open(path)
}

/// Read the next input event.
///
/// Returns `None` when no event is available yet. A closed device or
/// truncated event is reported as [`ErrorKind::UnexpectedEof`].
pub fn read_event<R: Read>(reader: &mut R) -> io::Result<Option<InputEvent>> {
    let mut buffer = [0; EVENT_SIZE];
    let read = match reader.read(&mut buffer) {
        Ok(read) => read,
        Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
        Err(err) if err.kind() == ErrorKind::Interrupted => return Ok(None),
        Err(err) => return Err(err),
    };

    if read != EVENT_SIZE {
        return Err(io::Error::new(ErrorKind::UnexpectedEof, "touch device closed"));
    }

    let event: libc::input_event = unsafe { ptr::read_unaligned(buffer.as_ptr().cast()) };
    Ok(Some(event.into()))
}

/// Event loop state.
struct State {
    event_loop: LoopHandle<'static, Self>,
    device_token: Option<RegistrationToken>,
    detector: Detector,
    terminated: bool,
}

impl State {
    fn new(event_loop: LoopHandle<'static, Self>, detector: Detector) -> Self {
        Self {
            event_loop,
            detector,
            device_token: Default::default(),
            terminated: Default::default(),
        }
    }

    /// Process all available touch events.
    fn handle_readiness(&mut self, mut device: &File) -> PostAction {
        loop {
            let event = match read_event(&mut device) {
                Ok(Some(event)) => event,
                Ok(None) => return PostAction::Continue,
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                    info!("Touch device closed");
                    self.terminated = true;
                    return PostAction::Remove;
                },
                Err(err) => {
                    error!("Error reading from touch device: {err}");
                    self.terminated = true;
                    return PostAction::Remove;
                },
            };

            // Stop reading input until the touch state has settled.
            if let Some(delay) = self.detector.handle_event(event) {
                if self.settle(delay) {
                    return PostAction::Disable;
                }
            }
        }
    }

    /// Schedule resumption of input processing.
    ///
    /// Returns `false` if input processing should continue immediately.
    fn settle(&mut self, delay: Duration) -> bool {
        let timer = Timer::from_duration(delay);
        let result = self.event_loop.insert_source(timer, |_, _, state| {
            state.resume();
            TimeoutAction::Drop
        });

        match result {
            Ok(_) => true,
            Err(err) => {
                error!("Failed to schedule settle timer: {}", err.error);
                false
            },
        }
    }

    /// Resume touch input processing.
    fn resume(&mut self) {
        if let Some(token) = &self.device_token {
            trace_error(self.event_loop.enable(token));
        }
    }
}
