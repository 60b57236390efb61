//! A small harness for building a `GameBoy` under controlled conditions,
//! used by integration-style tests elsewhere in the crate. Link-cable
//! fixtures and licensee/region metadata are teacher-repo features this
//! core does not carry (serial-link emulation and Game Boy Color support
//! are both out of scope), so the harness here only covers what this
//! crate actually implements: peripheral enable flags, the optional boot
//! ROM entry point, and running a loaded ROM for a bounded number of
//! cycles or up to a target PC.

use dmgboy_common::error::Error;

use crate::{
    data::BootRom,
    gb::{GameBoy, GameBoyMode},
    ppu::FRAME_BUFFER_SIZE,
};

#[derive(Default)]
pub struct TestOptions {
    pub mode: Option<GameBoyMode>,
    pub ppu_enabled: Option<bool>,
    pub apu_enabled: Option<bool>,
    pub dma_enabled: Option<bool>,
    pub timer_enabled: Option<bool>,
    pub boot_rom: Option<BootRom>,
}

pub fn build_test(options: TestOptions) -> Box<GameBoy> {
    let mut game_boy = Box::new(GameBoy::new(options.mode));
    game_boy.set_ppu_enabled(options.ppu_enabled.unwrap_or(true));
    game_boy.set_apu_enabled(options.apu_enabled.unwrap_or(true));
    game_boy.set_dma_enabled(options.dma_enabled.unwrap_or(true));
    game_boy.set_timer_enabled(options.timer_enabled.unwrap_or(true));
    game_boy.load(false).unwrap();
    game_boy.load_boot_smart(options.boot_rom).unwrap();
    game_boy
}

pub fn run_test(
    rom_path: &str,
    max_cycles: Option<u64>,
    options: TestOptions,
) -> Result<Box<GameBoy>, Error> {
    let max_cycles = max_cycles.unwrap_or(u64::MAX);
    let mut game_boy = build_test(options);
    game_boy.load_rom_file(rom_path, None)?;
    game_boy.clocks_cycles(max_cycles as usize);
    Ok(game_boy)
}

pub fn run_step_test(
    rom_path: &str,
    addr: u16,
    options: TestOptions,
) -> Result<Box<GameBoy>, Error> {
    let mut game_boy = build_test(options);
    game_boy.load_rom_file(rom_path, None)?;
    game_boy.step_to(addr);
    Ok(game_boy)
}

pub fn run_image_test(
    rom_path: &str,
    max_cycles: Option<u64>,
    options: TestOptions,
) -> Result<([u8; FRAME_BUFFER_SIZE], Box<GameBoy>), Error> {
    let mut game_boy = run_test(rom_path, max_cycles, options)?;
    Ok((*game_boy.frame_buffer(), game_boy))
}

#[cfg(test)]
mod tests {
    use crate::{
        consts::{
            BGP_ADDR, DIV_ADDR, IF_ADDR, LCDC_ADDR, LYC_ADDR, OBP0_ADDR, OBP1_ADDR, SCX_ADDR,
            SCY_ADDR, STAT_ADDR, TAC_ADDR, TIMA_ADDR, TMA_ADDR, WX_ADDR, WY_ADDR,
        },
        data::BootRom,
    };

    use super::{build_test, TestOptions};

    #[test]
    fn test_boot_rom_reaches_cartridge_entry_point() {
        let mut game_boy = build_test(TestOptions {
            boot_rom: Some(BootRom::Dmg),
            ..Default::default()
        });
        game_boy.load_rom_empty().unwrap();
        game_boy.step_to(0x0100);

        assert_eq!(game_boy.cpu_i().pc(), 0x0100);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffe);
        assert_eq!(game_boy.cpu_i().af(), 0x01b0);
        assert_eq!(game_boy.cpu_i().bc(), 0x0013);
        assert_eq!(game_boy.cpu_i().de(), 0x00d8);
        assert_eq!(game_boy.cpu_i().hl(), 0x014d);
        assert!(!game_boy.cpu_i().ime());

        assert_eq!(game_boy.mmu().read(DIV_ADDR), 0xcf);
        assert_eq!(game_boy.mmu().read(TIMA_ADDR), 0x00);
        assert_eq!(game_boy.mmu().read(TMA_ADDR), 0x00);
        assert_eq!(game_boy.mmu().read(TAC_ADDR) & 0x07, 0x00);
        assert_eq!(game_boy.mmu().read(IF_ADDR) & 0x1f, 0x01);

        assert_eq!(game_boy.ppu().read(LCDC_ADDR), 0x91);
        assert_eq!(game_boy.ppu().read(STAT_ADDR) & 0x03, 0x01);
        assert_eq!(game_boy.ppu().read(SCY_ADDR), 0x00);
        assert_eq!(game_boy.ppu().read(SCX_ADDR), 0x00);
        assert_eq!(game_boy.ppu().read(LYC_ADDR), 0x00);
        assert_eq!(game_boy.ppu().read(BGP_ADDR), 0xfc);
        assert_eq!(game_boy.ppu().read(OBP0_ADDR), 0x00);
        assert_eq!(game_boy.ppu().read(OBP1_ADDR), 0x00);
        assert_eq!(game_boy.ppu().read(WX_ADDR), 0x00);
        assert_eq!(game_boy.ppu().read(WY_ADDR), 0x00);
    }

    #[test]
    fn test_no_boot_rom_reset_matches_post_boot_values() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom_empty().unwrap();
        game_boy.reset();

        assert_eq!(game_boy.cpu_i().af(), 0x01b0);
        assert_eq!(game_boy.cpu_i().pc(), 0x0100);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffe);
    }
}
