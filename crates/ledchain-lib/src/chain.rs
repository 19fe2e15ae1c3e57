//! Controller chain: ordered controllers with contiguous ids, always retransmitted whole.
//!
//! Every color or membership change re-sends the whole chain before the
//! mutating call returns. There is no partial update path.

use embedded_hal::digital::OutputPin;

use crate::color::{Color, ColorChange};
use crate::error::{LedchainError, Result};
use crate::gpio::GpioError;
use crate::protocol::ClockDataBus;
use crate::store::{ChainState, SavedController};

/// Name prefix for generated controller names.
pub const DEFAULT_NAME_PREFIX: &str = "Controller";

/// One addressable position in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    id: usize,
    name: String,
    color: Color,
}

impl Controller {
    /// 0-based position in the chain.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// Whether a transmission is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Transmitting,
}

/// Ordered P9813 chain plus the two lines it is wired to.
#[derive(Debug)]
pub struct ChainDriver<C, D> {
    bus: ClockDataBus<C, D>,
    controllers: Vec<Controller>,
    state: DriverState,
    name_prefix: String,
}

impl<C, D> ChainDriver<C, D>
where
    C: OutputPin,
    D: OutputPin,
    GpioError: From<C::Error> + From<D::Error>,
{
    /// New chain with one default controller, transmitted once.
    pub fn new(clock: C, data: D) -> Result<Self> {
        let mut chain = Self::empty(clock, data);
        chain.add_controller(None)?;
        Ok(chain)
    }

    /// Rebuild a chain from saved state, transmitted once.
    ///
    /// An empty state yields one default controller.
    pub fn restore(clock: C, data: D, state: &ChainState) -> Result<Self> {
        let mut chain = Self::empty(clock, data);
        chain.controllers = state
            .controllers
            .iter()
            .enumerate()
            .map(|(id, saved)| Controller {
                id,
                name: saved.name.clone(),
                color: saved.color,
            })
            .collect();
        if chain.controllers.is_empty() {
            log::warn!("saved state has no controllers, starting with a default one");
            let name = chain.generated_name(0);
            chain.controllers.push(Controller {
                id: 0,
                name,
                color: Color::OFF,
            });
        }
        chain.transmit()?;
        log::info!("restored chain with {} controller(s)", chain.len());
        Ok(chain)
    }

    fn empty(clock: C, data: D) -> Self {
        ChainDriver {
            bus: ClockDataBus::new(clock, data),
            controllers: Vec::new(),
            state: DriverState::Idle,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }

    /// Use `prefix` for names generated by [`add_controller`](Self::add_controller).
    pub fn with_name_prefix(mut self, prefix: &str) -> Self {
        self.name_prefix = prefix.to_string();
        self
    }

    fn generated_name(&self, id: usize) -> String {
        format!("{} {}", self.name_prefix, id + 1)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Always false once constructed; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    pub fn is_valid_id(&self, id: usize) -> bool {
        id < self.controllers.len() && !self.controllers.is_empty()
    }

    pub fn get(&self, id: usize) -> Result<&Controller> {
        self.controllers
            .get(id)
            .ok_or(LedchainError::IndexOutOfRange {
                id,
                len: self.controllers.len(),
            })
    }

    /// Mutable handle to one controller. Bulk color setters re-transmit.
    pub fn controller_mut(&mut self, id: usize) -> Result<ControllerMut<'_, C, D>> {
        if !self.is_valid_id(id) {
            return Err(LedchainError::IndexOutOfRange {
                id,
                len: self.controllers.len(),
            });
        }
        Ok(ControllerMut { chain: self, id })
    }

    /// Append a controller (color off) and re-transmit.
    ///
    /// `None` generates a name from the prefix and the new position. If the
    /// transmission fails the controller is dropped again.
    pub fn add_controller(&mut self, name: Option<&str>) -> Result<&Controller> {
        let id = self.controllers.len();
        let name = match name {
            Some(n) => n.to_string(),
            None => self.generated_name(id),
        };
        self.controllers.push(Controller {
            id,
            name,
            color: Color::OFF,
        });
        if let Err(e) = self.transmit() {
            self.controllers.pop();
            return Err(e);
        }
        let added = &self.controllers[id];
        log::info!("added controller {id} ({})", added.name);
        Ok(added)
    }

    /// Remove the controller at `id`, renumber the rest, re-transmit.
    ///
    /// Returns `Ok(false)` without doing anything when `id` is out of range or
    /// it is the last controller left. A failed transmission puts the
    /// controller back in place.
    pub fn remove_controller(&mut self, id: usize) -> Result<bool> {
        if !self.is_valid_id(id) || self.controllers.len() <= 1 {
            log::debug!("ignoring removal of controller {id} (chain has {})", self.len());
            return Ok(false);
        }
        let removed = self.controllers.remove(id);
        self.renumber();
        match self.transmit() {
            Ok(()) => {
                log::info!("removed controller {id} ({})", removed.name);
                Ok(true)
            }
            Err(e) => {
                self.controllers.insert(id, removed);
                self.renumber();
                Err(e)
            }
        }
    }

    fn renumber(&mut self) {
        for (i, c) in self.controllers.iter_mut().enumerate() {
            c.id = i;
        }
    }

    /// Send the whole chain over the lines.
    pub fn transmit(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, DriverState::Idle, "transmit is not reentrant");
        self.state = DriverState::Transmitting;
        log::debug!("transmitting {} node(s)", self.controllers.len());
        let colors: Vec<(u8, u8, u8)> = self.controllers.iter().map(|c| c.color.rgb()).collect();
        let result = self.bus.write_chain(colors);
        self.state = DriverState::Idle;
        result.map_err(LedchainError::from)
    }

    /// Turn every LED off on the wire without touching stored colors.
    pub fn blank(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, DriverState::Idle, "transmit is not reentrant");
        self.state = DriverState::Transmitting;
        log::debug!("blanking {} node(s)", self.controllers.len());
        let result = self
            .bus
            .write_chain(std::iter::repeat_n((0, 0, 0), self.controllers.len()));
        self.state = DriverState::Idle;
        result.map_err(LedchainError::from)
    }

    /// Exact bytes [`transmit`](Self::transmit) would send right now.
    pub fn frame_bytes(&self) -> Vec<u8> {
        crate::protocol::encode_chain(self.controllers.iter().map(|c| c.color.rgb()))
    }

    /// Names and HSV colors in chain order, for persistence.
    pub fn snapshot(&self) -> ChainState {
        ChainState {
            controllers: self
                .controllers
                .iter()
                .map(|c| SavedController {
                    name: c.name.clone(),
                    color: c.color,
                })
                .collect(),
        }
    }
}

/// Borrowed handle to one controller of a [`ChainDriver`].
///
/// Bulk color setters apply the change and then re-transmit the chain.
/// Single-field setters and [`set_name`](Self::set_name) only update state.
pub struct ControllerMut<'a, C, D> {
    chain: &'a mut ChainDriver<C, D>,
    id: usize,
}

impl<C, D> ControllerMut<'_, C, D>
where
    C: OutputPin,
    D: OutputPin,
    GpioError: From<C::Error> + From<D::Error>,
{
    fn color_mut(&mut self) -> &mut Color {
        &mut self.chain.controllers[self.id].color
    }

    fn propagate(&mut self, _change: ColorChange) -> Result<()> {
        self.chain.transmit()
    }

    pub fn get(&self) -> &Controller {
        &self.chain.controllers[self.id]
    }

    pub fn set_name(&mut self, name: &str) {
        self.chain.controllers[self.id].name = name.to_string();
    }

    pub fn set_rgb(&mut self, r: u8, g: u8, b: u8) -> Result<()> {
        let change = self.color_mut().set_rgb(r, g, b);
        self.propagate(change)
    }

    pub fn set_hsv(&mut self, h: u16, s: u8, v: u8) -> Result<()> {
        let change = self.color_mut().set_hsv(h, s, v);
        self.propagate(change)
    }

    /// On a malformed string nothing changes and nothing is sent.
    pub fn set_hex(&mut self, hex: &str) -> Result<()> {
        let change = self.color_mut().set_hex(hex)?;
        self.propagate(change)
    }

    pub fn set_temperature(&mut self, kelvin: u32) -> Result<()> {
        let change = self.color_mut().set_temperature(kelvin);
        self.propagate(change)
    }

    pub fn set_hue(&mut self, h: u16) {
        self.color_mut().set_hue(h);
    }

    pub fn set_saturation(&mut self, s: u8) {
        self.color_mut().set_saturation(s);
    }

    pub fn set_value(&mut self, v: u8) {
        self.color_mut().set_value(v);
    }
}
