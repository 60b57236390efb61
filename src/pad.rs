//! Joypad (P1/JOYP) functions and structures.

use dmgboy_common::error::Error;

use crate::state::{StateComponent, StateFormat};

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

pub struct Pad {
    down: bool,
    up: bool,
    left: bool,
    right: bool,
    start: bool,
    select: bool,
    b: bool,
    a: bool,
    selection: PadSelection,
    int_pad: bool,
}

#[derive(Clone, Copy, PartialEq)]
pub enum PadSelection {
    Action,
    Direction,
}

#[cfg_attr(feature = "wasm", wasm_bindgen)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

impl Pad {
    pub fn new() -> Self {
        Self {
            down: false,
            up: false,
            left: false,
            right: false,
            start: false,
            select: false,
            b: false,
            a: false,
            selection: PadSelection::Action,
            int_pad: false,
        }
    }

    pub fn reset(&mut self) {
        self.down = false;
        self.up = false;
        self.left = false;
        self.right = false;
        self.start = false;
        self.select = false;
        self.b = false;
        self.a = false;
        self.selection = PadSelection::Action;
        self.int_pad = false;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr & 0x00ff {
            0x0000 => {
                // bits 6-7 are unused and always read back as 1
                let mut value = 0xc0;
                value |= match self.selection {
                    PadSelection::Direction => 0x10,
                    PadSelection::Action => 0x20,
                };
                match self.selection {
                    PadSelection::Action => {
                        value |= if self.a { 0x00 } else { 0x01 }
                            | if self.b { 0x00 } else { 0x02 }
                            | if self.select { 0x00 } else { 0x04 }
                            | if self.start { 0x00 } else { 0x08 };
                    }
                    PadSelection::Direction => {
                        value |= if self.right { 0x00 } else { 0x01 }
                            | if self.left { 0x00 } else { 0x02 }
                            | if self.up { 0x00 } else { 0x04 }
                            | if self.down { 0x00 } else { 0x08 };
                    }
                }
                value
            }
            addr => panic!("Reading from unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr & 0x00ff {
            0x0000 => {
                self.selection = if value & 0x10 == 0x00 {
                    PadSelection::Direction
                } else {
                    PadSelection::Action
                }
            }
            addr => panic!("Writing to unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn key_press(&mut self, key: PadKey) {
        let already_pressed = self.is_pressed(key);
        match key {
            PadKey::Up => self.up = true,
            PadKey::Down => self.down = true,
            PadKey::Left => self.left = true,
            PadKey::Right => self.right = true,
            PadKey::Start => self.start = true,
            PadKey::Select => self.select = true,
            PadKey::A => self.a = true,
            PadKey::B => self.b = true,
        }
        // a key transitioning from not-pressed to pressed in the
        // currently selected row requests the Joypad interrupt
        if !already_pressed && self.in_selected_row(key) {
            self.int_pad = true;
        }
    }

    pub fn key_lift(&mut self, key: PadKey) {
        match key {
            PadKey::Up => self.up = false,
            PadKey::Down => self.down = false,
            PadKey::Left => self.left = false,
            PadKey::Right => self.right = false,
            PadKey::Start => self.start = false,
            PadKey::Select => self.select = false,
            PadKey::A => self.a = false,
            PadKey::B => self.b = false,
        }
    }

    fn is_pressed(&self, key: PadKey) -> bool {
        match key {
            PadKey::Up => self.up,
            PadKey::Down => self.down,
            PadKey::Left => self.left,
            PadKey::Right => self.right,
            PadKey::Start => self.start,
            PadKey::Select => self.select,
            PadKey::A => self.a,
            PadKey::B => self.b,
        }
    }

    fn in_selected_row(&self, key: PadKey) -> bool {
        match self.selection {
            PadSelection::Action => {
                matches!(key, PadKey::A | PadKey::B | PadKey::Start | PadKey::Select)
            }
            PadSelection::Direction => {
                matches!(
                    key,
                    PadKey::Up | PadKey::Down | PadKey::Left | PadKey::Right
                )
            }
        }
    }

    #[inline(always)]
    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    #[inline(always)]
    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    #[inline(always)]
    pub fn ack_pad(&mut self) {
        self.set_int_pad(false);
    }
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

impl StateComponent for Pad {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let selection = matches!(self.selection, PadSelection::Action) as u8;
        Ok(vec![
            self.down as u8,
            self.up as u8,
            self.left as u8,
            self.right as u8,
            self.start as u8,
            self.select as u8,
            self.b as u8,
            self.a as u8,
            selection,
            self.int_pad as u8,
        ])
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        if data.len() < 10 {
            return Err(Error::InvalidData);
        }
        self.down = data[0] != 0;
        self.up = data[1] != 0;
        self.left = data[2] != 0;
        self.right = data[3] != 0;
        self.start = data[4] != 0;
        self.select = data[5] != 0;
        self.b = data[6] != 0;
        self.a = data[7] != 0;
        self.selection = if data[8] != 0 {
            PadSelection::Action
        } else {
            PadSelection::Direction
        };
        self.int_pad = data[9] != 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Pad, PadKey};

    #[test]
    fn test_unused_bits_read_as_one() {
        let mut pad = Pad::new();
        assert_eq!(pad.read(0x0000) & 0xc0, 0xc0);
    }

    #[test]
    fn test_press_in_selected_row_requests_interrupt() {
        let mut pad = Pad::new();
        pad.write(0x0000, 0x10); // select direction row (bit 4 = 0)
        assert!(!pad.int_pad());
        pad.key_press(PadKey::Up);
        assert!(pad.int_pad());
    }

    #[test]
    fn test_press_in_other_row_does_not_request_interrupt() {
        let mut pad = Pad::new();
        pad.write(0x0000, 0x10); // direction row selected
        pad.key_press(PadKey::A); // action key, not in the selected row
        assert!(!pad.int_pad());
    }

    #[test]
    fn test_not_pressed_bits_read_high() {
        let mut pad = Pad::new();
        pad.write(0x0000, 0x20); // select action row
        assert_eq!(pad.read(0x0000) & 0x0f, 0x0f);
        pad.key_press(PadKey::A);
        assert_eq!(pad.read(0x0000) & 0x01, 0x00);
    }
}
