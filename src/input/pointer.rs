//! Pointer input via libinput
//!
//! Uses the libinput udev backend so mice can be plugged and unplugged
//! while the loop runs. Button state is accumulated from libinput's
//! press/release events and handed out as level samples.

use input::event::pointer::ButtonState;
use input::event::{DeviceEvent, Event, EventTrait, PointerEvent};
use input::{DeviceCapability, Libinput, LibinputInterface};
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::OwnedFd;
use std::path::Path;

use super::device::{PointerDevice, PointerSample};
use super::edge::ButtonStateSet;
use super::event::MouseButton;
use crate::error::{Error, Result};
use crate::session::Release;

/// LibinputInterface implementation for libinput
struct InputInterface;

impl LibinputInterface for InputInterface {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> std::result::Result<OwnedFd, i32> {
        let f = OpenOptions::new()
            .read(true)
            .write((flags & libc::O_WRONLY != 0) || (flags & libc::O_RDWR != 0))
            .custom_flags(flags & !libc::O_WRONLY & !libc::O_RDWR & !libc::O_RDONLY)
            .open(path)
            .map_err(|e| {
                warn!("Cannot open device: {:?}: {}", path, e);
                e.raw_os_error().unwrap_or(-libc::ENOENT)
            })?;
        Ok(OwnedFd::from(f))
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

/// libinput-backed mouse
pub struct LibinputPointer {
    /// libinput context
    input: Libinput,
    /// Pointer X coordinate (pixels)
    x: f64,
    /// Pointer Y coordinate (pixels)
    y: f64,
    /// Display width (for coordinate clamping)
    width: f64,
    /// Display height (for coordinate clamping)
    height: f64,
    /// Buttons currently held
    held: ButtonStateSet<MouseButton>,
    /// Buttons pressed since the last sample (catches press+release in one dispatch)
    latched: ButtonStateSet<MouseButton>,
    /// A latched button was already released; the next poll must resample
    resample: bool,
    /// Attached devices with the pointer capability
    pointer_devices: usize,
    /// Context suspended (devices handed back)
    suspended: bool,
}

impl LibinputPointer {
    /// Open a udev-backed libinput context on `seat`
    ///
    /// The cursor starts centred on a `width` x `height` display.
    pub fn open(seat: &str, width: u32, height: u32) -> Result<Self> {
        let mut input = Libinput::new_with_udev(InputInterface);
        input
            .udev_assign_seat(seat)
            .map_err(|()| Error::device("pointer", format!("cannot assign seat {}", seat)))?;

        info!("Pointer input initialized (seat={}, {}x{})", seat, width, height);

        Ok(Self {
            input,
            x: width as f64 / 2.0,
            y: height as f64 / 2.0,
            width: width as f64,
            height: height as f64,
            held: ButtonStateSet::new(),
            latched: ButtonStateSet::new(),
            resample: false,
            pointer_devices: 0,
            suspended: false,
        })
    }

    fn clamp(&mut self) {
        self.x = self.x.clamp(0.0, (self.width - 1.0).max(0.0));
        self.y = self.y.clamp(0.0, (self.height - 1.0).max(0.0));
    }

    /// Apply one libinput event; true if pointer state changed
    fn apply(&mut self, event: Event) -> bool {
        match event {
            Event::Device(DeviceEvent::Added(ev)) => {
                let device = ev.device();
                if device.has_capability(DeviceCapability::Pointer) {
                    self.pointer_devices += 1;
                    info!("Pointer attached: {}", device.name());
                }
                false
            }
            Event::Device(DeviceEvent::Removed(ev)) => {
                let device = ev.device();
                if device.has_capability(DeviceCapability::Pointer) {
                    self.pointer_devices = self.pointer_devices.saturating_sub(1);
                    info!("Pointer detached: {}", device.name());
                    if self.pointer_devices == 0 {
                        self.held = ButtonStateSet::new();
                        self.latched = ButtonStateSet::new();
                    }
                }
                false
            }
            Event::Pointer(PointerEvent::Motion(m)) => {
                self.x += m.dx();
                self.y += m.dy();
                self.clamp();
                true
            }
            Event::Pointer(PointerEvent::MotionAbsolute(m)) => {
                // Absolute coordinates (touchpad, tablet, etc.)
                self.x = m.absolute_x_transformed(self.width as u32);
                self.y = m.absolute_y_transformed(self.height as u32);
                self.clamp();
                true
            }
            Event::Pointer(PointerEvent::Button(b)) => {
                let button = MouseButton::from_code(b.button());
                debug!("Mouse button: {:?} state={:?}", button, b.button_state());
                self.held = match b.button_state() {
                    ButtonState::Pressed => {
                        self.latched = self.latched.with(button);
                        self.held.with(button)
                    }
                    ButtonState::Released => self.held.without(button),
                };
                true
            }
            _ => false,
        }
    }
}

impl PointerDevice for LibinputPointer {
    fn poll(&mut self) -> Result<Option<PointerSample>> {
        if self.suspended {
            return Ok(None);
        }

        self.input
            .dispatch()
            .map_err(|e| Error::device("pointer", e))?;

        let mut changed = false;
        while let Some(event) = self.input.next() {
            changed |= self.apply(event);
        }

        if !changed && !self.resample {
            return Ok(None);
        }

        // A click that started and ended within one dispatch still shows as
        // held for one sample; the following poll reports the release.
        let buttons = self.latched.iter().fold(self.held.clone(), |set, b| set.with(b));
        self.resample = self.latched.iter().any(|b| !self.held.contains(b));
        self.latched = ButtonStateSet::new();

        Ok(Some(PointerSample {
            buttons,
            x: self.x.round() as i32,
            y: self.y.round() as i32,
        }))
    }

    fn is_attached(&self) -> bool {
        self.pointer_devices > 0
    }
}

impl Release for LibinputPointer {
    fn release(&mut self) -> Result<()> {
        if !self.suspended {
            self.input.suspend();
            self.suspended = true;
            self.pointer_devices = 0;
            info!("Pointer devices released");
        }
        Ok(())
    }
}
