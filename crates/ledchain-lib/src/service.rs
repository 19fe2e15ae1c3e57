//! Shared chain: a single lock held across each change, its transmission and the save.
//!
//! Callers on several threads (a request handler, a scheduler) go through
//! [`SharedChain`]; each operation takes the lock once, mutates the chain
//! (which transmits), and saves the new state before releasing it. Nothing is
//! saved when the transmission fails.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::OutputPin;

use crate::chain::{ChainDriver, Controller, DEFAULT_NAME_PREFIX};
use crate::color::parse_color;
use crate::error::Result;
use crate::gpio::GpioError;
use crate::store::{ChainState, SavedController};

/// A bulk color assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorUpdate {
    Rgb(u8, u8, u8),
    Hsv(u16, u8, u8),
    /// Hex string or color name.
    Named(String),
    /// Color temperature in Kelvin; brightness is kept.
    Temperature(u32),
    /// Value (brightness) only, in percent.
    Brightness(u8),
}

pub struct SharedChain<C, D> {
    chain: Mutex<ChainDriver<C, D>>,
    store: Option<PathBuf>,
}

impl<C, D> SharedChain<C, D>
where
    C: OutputPin,
    D: OutputPin,
    GpioError: From<C::Error> + From<D::Error>,
{
    /// Wrap an existing driver. `store` = `None` keeps state in memory only.
    pub fn new(chain: ChainDriver<C, D>, store: Option<PathBuf>) -> Self {
        SharedChain {
            chain: Mutex::new(chain),
            store,
        }
    }

    /// Load saved state from `store` (or start with one default controller)
    /// and transmit it.
    pub fn open(clock: C, data: D, store: Option<PathBuf>, name_prefix: &str) -> Result<Self> {
        let prefix = if name_prefix.trim().is_empty() {
            DEFAULT_NAME_PREFIX
        } else {
            name_prefix
        };
        let state = store
            .as_deref()
            .and_then(ChainState::load)
            .unwrap_or_else(|| ChainState {
                controllers: vec![SavedController {
                    name: format!("{prefix} 1"),
                    color: Default::default(),
                }],
            });
        let chain = ChainDriver::restore(clock, data, &state)?.with_name_prefix(prefix);
        Ok(Self::new(chain, store))
    }

    fn lock(&self) -> MutexGuard<'_, ChainDriver<C, D>> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the locked chain, then persist if it succeeded.
    pub fn with<R>(&self, f: impl FnOnce(&mut ChainDriver<C, D>) -> Result<R>) -> Result<R> {
        let mut chain = self.lock();
        let out = f(&mut chain)?;
        if let Some(path) = &self.store {
            chain.snapshot().save_to(path)?;
            log::debug!("saved chain state to {}", path.display());
        }
        Ok(out)
    }

    /// Run `f` on the locked chain without persisting.
    pub fn read<R>(&self, f: impl FnOnce(&ChainDriver<C, D>) -> R) -> R {
        f(&self.lock())
    }

    /// Returns the new controller's id.
    pub fn add_controller(&self, name: Option<&str>) -> Result<usize> {
        self.with(|chain| chain.add_controller(name).map(Controller::id))
    }

    /// `Ok(false)` for an out-of-range id or the last controller.
    pub fn remove_controller(&self, id: usize) -> Result<bool> {
        self.with(|chain| chain.remove_controller(id))
    }

    pub fn get(&self, id: usize) -> Result<Controller> {
        self.read(|chain| chain.get(id).cloned())
    }

    pub fn is_valid_id(&self, id: usize) -> bool {
        self.read(|chain| chain.is_valid_id(id))
    }

    pub fn controllers(&self) -> Vec<Controller> {
        self.read(|chain| chain.controllers().to_vec())
    }

    pub fn set_name(&self, id: usize, name: &str) -> Result<()> {
        self.with(|chain| {
            chain.controller_mut(id)?.set_name(name);
            Ok(())
        })
    }

    /// Apply a bulk color change and return the updated controller.
    pub fn set_color(&self, id: usize, update: ColorUpdate) -> Result<Controller> {
        self.with(|chain| {
            let mut c = chain.controller_mut(id)?;
            match update {
                ColorUpdate::Rgb(r, g, b) => c.set_rgb(r, g, b)?,
                ColorUpdate::Hsv(h, s, v) => c.set_hsv(h, s, v)?,
                ColorUpdate::Named(ref s) => {
                    let (r, g, b) = parse_color(s)?;
                    c.set_rgb(r, g, b)?
                }
                ColorUpdate::Temperature(k) => c.set_temperature(k)?,
                ColorUpdate::Brightness(v) => {
                    c.set_value(v);
                    chain.transmit()?
                }
            }
            chain.get(id).cloned()
        })
    }

    /// Turn the LEDs off on the wire; saved colors are untouched.
    pub fn blank(&self) -> Result<()> {
        self.lock().blank()
    }

    /// Re-send the current state.
    pub fn refresh(&self) -> Result<()> {
        self.lock().transmit()
    }

    pub fn frame_bytes(&self) -> Vec<u8> {
        self.read(|chain| chain.frame_bytes())
    }
}
