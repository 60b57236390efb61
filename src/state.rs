//! Save-state serialization interface.
//!
//! Persisted state is out of this core's scope to *drive* (no save-state
//! browser, no thumbnail rendering), but the interface is specified: every
//! stateful component implements [`StateComponent`] so that the full
//! register file, MMU memory vectors, timer counters, PPU mode/line/cycle
//! and APU channel state can be captured and restored by a host.

use std::io::Cursor;

use dmgboy_common::error::Error;

/// Selects the binary layout used by [`StateComponent::state`] and
/// [`StateComponent::set_state`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum StateFormat {
    /// Native format: a flat concatenation of each component's fields in
    /// declaration order, little-endian. Not meant to be read by other
    /// emulators, only by this core.
    #[default]
    Bos,
}

/// A component whose internal state can be captured to a byte buffer and
/// later restored from one, for save-state purposes.
pub trait StateComponent {
    fn state(&self, format: Option<StateFormat>) -> Result<Vec<u8>, Error>;
    fn set_state(&mut self, data: &[u8], format: Option<StateFormat>) -> Result<(), Error>;
}

pub(crate) fn cursor(data: &[u8]) -> Cursor<&[u8]> {
    Cursor::new(data)
}

/// Layout mirroring the BESS ("Best Effort Save State") block format used
/// by several community Game Boy emulators for cross-emulator save-state
/// interop. Kept here as a documented reference layout; this core does not
/// populate or parse it, see the Open Questions in `DESIGN.md`.
#[repr(packed)]
pub struct BeesBlock {
    pub magic: u32,
    pub size: u32,
}

#[repr(packed)]
pub struct BeesBuffer {
    pub size: u32,
    pub offset: u32,
}

#[repr(packed)]
pub struct BeesFooter {
    pub start_offset: u32,
    pub magic: u32,
}

#[repr(packed)]
pub struct BeesCore {
    pub header: BeesBlock,

    pub major: u16,
    pub minor: u16,

    pub model: u32,

    pub pc: u16,
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub sp: u16,

    pub ime: u8,
    pub ie: u8,
    // 0 = running; 1 = halted; 2 = stopped
    pub execution_mode: u8,
    _padding: u8,

    pub io_registers: [u8; 0x80],

    pub ram: BeesBuffer,
    pub vram: BeesBuffer,
    pub mbc_ram: BeesBuffer,
    pub oam: BeesBuffer,
    pub hram: BeesBuffer,
    pub background_palettes: BeesBuffer,
    pub object_palettes: BeesBuffer,
}
