//! Serial transfer (SB/SC) register functions and structures.
//!
//! Link-cable transfer timing and the partner-device protocol are out of
//! scope for this core: no external device is ever attached, so a transfer
//! triggered by a write to SC never completes and the Serial interrupt is
//! never raised in practice. The registers, the interrupt request line and
//! its vector are still fully wired, since host software is free to poll or
//! write them.

use std::io::Cursor;

use dmgboy_common::{
    data::{read_u8, write_u8},
    error::Error,
};

use crate::{
    consts::{SB_ADDR, SC_ADDR},
    mmu::BusComponent,
    state::{StateComponent, StateFormat},
    warnln,
};

pub struct Serial {
    data: u8,
    shift_clock: bool,
    clock_speed: bool,
    transfer_enabled: bool,
    int_serial: bool,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            data: 0x0,
            shift_clock: false,
            clock_speed: false,
            transfer_enabled: false,
            int_serial: false,
        }
    }

    pub fn reset(&mut self) {
        self.data = 0x0;
        self.shift_clock = false;
        self.clock_speed = false;
        self.transfer_enabled = false;
        self.int_serial = false;
    }

    /// No-op: with no partner device attached a transfer never completes,
    /// so there is nothing for the Serial component to clock.
    pub fn clock(&mut self, _cycles: u16) {}

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0xFF01 — SB: Serial transfer data
            SB_ADDR => self.data,
            // 0xFF02 — SC: Serial transfer control
            SC_ADDR =>
            {
                #[allow(clippy::bool_to_int_with_if)]
                (0x7c | if self.shift_clock { 0x01 } else { 0x00 }
                    | if self.clock_speed { 0x02 } else { 0x00 }
                    | if self.transfer_enabled { 0x80 } else { 0x00 })
            }
            _ => {
                warnln!("Reding from unknown Serial location 0x{:04x}", addr);
                #[allow(unreachable_code)]
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0xFF01 — SB: Serial transfer data
            SB_ADDR => self.data = value,
            // 0xFF02 — SC: Serial transfer control
            SC_ADDR => {
                self.shift_clock = value & 0x01 == 0x01;
                self.clock_speed = value & 0x02 == 0x02;
                self.transfer_enabled = value & 0x80 == 0x80;
            }
            _ => warnln!("Writing to unknown Serial location 0x{:04x}", addr),
        }
    }

    #[inline(always)]
    pub fn int_serial(&self) -> bool {
        self.int_serial
    }

    #[inline(always)]
    pub fn set_int_serial(&mut self, value: bool) {
        self.int_serial = value;
    }

    #[inline(always)]
    pub fn ack_serial(&mut self) {
        self.set_int_serial(false);
    }

    pub fn shift_clock(&self) -> bool {
        self.shift_clock
    }

    pub fn set_shift_clock(&mut self, value: bool) {
        self.shift_clock = value;
    }
}

impl BusComponent for Serial {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}

impl StateComponent for Serial {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(vec![]);
        write_u8(&mut cursor, self.data)?;
        write_u8(&mut cursor, self.shift_clock as u8)?;
        write_u8(&mut cursor, self.clock_speed as u8)?;
        write_u8(&mut cursor, self.transfer_enabled as u8)?;
        write_u8(&mut cursor, self.int_serial as u8)?;
        Ok(cursor.into_inner())
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = Cursor::new(data);
        self.data = read_u8(&mut cursor)?;
        self.shift_clock = read_u8(&mut cursor)? != 0;
        self.clock_speed = read_u8(&mut cursor)? != 0;
        self.transfer_enabled = read_u8(&mut cursor)? != 0;
        self.int_serial = read_u8(&mut cursor)? != 0;
        Ok(())
    }
}

unsafe impl Send for Serial {}

#[cfg(test)]
mod tests {
    use super::Serial;
    use crate::consts::{SB_ADDR, SC_ADDR};

    #[test]
    fn test_sb_read_write() {
        let mut serial = Serial::new();
        serial.write(SB_ADDR, 0xab);
        assert_eq!(serial.read(SB_ADDR), 0xab);
    }

    #[test]
    fn test_sc_unused_bits_read_as_one() {
        let mut serial = Serial::new();
        assert_eq!(serial.read(SC_ADDR) & 0x7c, 0x7c);
    }

    #[test]
    fn test_clock_never_raises_interrupt() {
        let mut serial = Serial::new();
        serial.write(SC_ADDR, 0x81);
        serial.clock(10_000);
        assert!(!serial.int_serial());
    }
}
