//! Driver for the XT25F32B SPI NOR flash sitting on the shared bus next to
//! the display. The watch only keeps its settings record here, but the
//! driver exposes the full `embedded-storage` traits.

use bitflags::bitflags;
use embedded_hal::spi::{Operation, SpiDevice};
use embedded_storage::nor_flash::{
    check_erase, check_write, ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

const PAGE_SIZE: usize = 256;
const SECTOR_SIZE: usize = 4096;
const FLASH_SIZE: usize = 4 * 1024 * 1024;

// The nRF52832 SPIM DMA moves at most 255 bytes per transfer, so bus
// traffic is chunked to half a page.
const CHUNK: usize = PAGE_SIZE / 2;

const CMD_PAGE_PROGRAM: u8 = 0x02;
const CMD_READ: u8 = 0x03;
const CMD_READ_STATUS: u8 = 0x05;
const CMD_WRITE_ENABLE: u8 = 0x06;
const CMD_SECTOR_ERASE: u8 = 0x20;
const CMD_VOLATILE_SR_WRITE_ENABLE: u8 = 0x50;
const CMD_GLOBAL_BLOCK_UNLOCK: u8 = 0x98;
const CMD_READ_ID: u8 = 0x9F;
const CMD_WAKEUP: u8 = 0xAB;

const JEDEC_MANUFACTURER_XTX: u8 = 0x0B;
const JEDEC_MEMORY_TYPE: u8 = 0x40;

bitflags! {
    /// Status register bits.
    #[derive(Debug)]
    pub struct Status: u8 {
        /// Erase or write in progress.
        const BUSY = 1 << 0;
        /// Write enable latch.
        const WEL = 1 << 1;
    }
}

#[derive(Debug)]
pub enum Error<SPI> {
    Spi(SPI),
    Flash(NorFlashErrorKind),
    UnknownChip { manufacturer: u8, memory_type: u8 },
    BufferNotInRam,
}

impl<SPI> From<SPI> for Error<SPI> {
    fn from(spi: SPI) -> Self {
        Self::Spi(spi)
    }
}

pub struct XtFlash<SPI: SpiDevice> {
    spi: SPI,
}

impl<SPI: SpiDevice> XtFlash<SPI> {
    /// Wake the chip, verify its JEDEC id and unlock all blocks.
    pub fn new(mut spi: SPI) -> Result<Self, Error<SPI::Error>> {
        let mut wake = [CMD_WAKEUP, 0, 0, 0];
        spi.transfer_in_place(&mut wake[..])?;

        let mut id = [CMD_READ_ID, 0, 0, 0];
        spi.transfer_in_place(&mut id[..])?;
        if id[1] != JEDEC_MANUFACTURER_XTX || id[2] != JEDEC_MEMORY_TYPE {
            return Err(Error::UnknownChip {
                manufacturer: id[1],
                memory_type: id[2],
            });
        }

        spi.write(&[CMD_GLOBAL_BLOCK_UNLOCK])?;
        spi.write(&[CMD_VOLATILE_SR_WRITE_ENABLE])?;

        Ok(Self { spi })
    }

    pub fn read(&mut self, mut offset: u32, data: &mut [u8]) -> Result<(), Error<SPI::Error>> {
        for chunk in data.chunks_mut(CHUNK) {
            let addr = offset.to_be_bytes();
            let cmd = [CMD_READ, addr[1], addr[2], addr[3]];
            self.spi
                .transaction(&mut [Operation::Write(&cmd[..]), Operation::Read(chunk)])?;
            offset += chunk.len() as u32;
        }
        Ok(())
    }

    pub fn write(&mut self, mut offset: u32, data: &[u8]) -> Result<(), Error<SPI::Error>> {
        check_write(self, offset, data.len()).map_err(Error::Flash)?;
        for chunk in data.chunks(CHUNK) {
            self.write_enable()?;

            let addr = offset.to_be_bytes();
            let cmd = [CMD_PAGE_PROGRAM, addr[1], addr[2], addr[3]];
            self.spi
                .transaction(&mut [Operation::Write(&cmd[..]), Operation::Write(chunk)])?;

            self.wait_idle()?;
            offset += chunk.len() as u32;
        }
        Ok(())
    }

    pub fn erase(&mut self, from: u32, to: u32) -> Result<(), Error<SPI::Error>> {
        check_erase(self, from, to).map_err(Error::Flash)?;
        for sector in (from..to).step_by(SECTOR_SIZE) {
            self.write_enable()?;

            let addr = sector.to_be_bytes();
            self.spi.transaction(&mut [Operation::TransferInPlace(&mut [
                CMD_SECTOR_ERASE,
                addr[1],
                addr[2],
                addr[3],
            ])])?;

            self.wait_idle()?;
        }
        Ok(())
    }

    pub fn status(&mut self) -> Result<Status, Error<SPI::Error>> {
        let mut value = [CMD_READ_STATUS, 0x00];
        self.spi
            .transaction(&mut [Operation::TransferInPlace(&mut value[..])])?;
        Ok(Status::from_bits_truncate(value[1]))
    }

    fn write_enable(&mut self) -> Result<(), Error<SPI::Error>> {
        self.spi.transaction(&mut [Operation::Write(&[CMD_WRITE_ENABLE])])?;
        while !self.status()?.contains(Status::WEL) {}
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), Error<SPI::Error>> {
        while self.status()?.contains(Status::BUSY) {}
        Ok(())
    }
}

impl<SPI: core::fmt::Debug> NorFlashError for Error<SPI> {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Self::Flash(kind) => *kind,
            _ => NorFlashErrorKind::Other,
        }
    }
}

impl<SPI: SpiDevice> ErrorType for XtFlash<SPI> {
    type Error = Error<SPI::Error>;
}

impl<SPI: SpiDevice> ReadNorFlash for XtFlash<SPI> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        ensure_in_ram(buf)?;
        XtFlash::read(self, offset, buf)
    }

    fn capacity(&self) -> usize {
        FLASH_SIZE
    }
}

impl<SPI: SpiDevice> NorFlash for XtFlash<SPI> {
    const WRITE_SIZE: usize = 1;
    const ERASE_SIZE: usize = SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        XtFlash::erase(self, from, to)
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), Self::Error> {
        ensure_in_ram(data)?;
        XtFlash::write(self, offset, data)
    }
}

const SRAM_LOWER: usize = 0x2000_0000;
const SRAM_UPPER: usize = 0x3000_0000;

// EasyDMA can only move buffers that live in RAM; flash-resident data
// silently transfers garbage.
fn ensure_in_ram<SPI>(buf: &[u8]) -> Result<(), Error<SPI>> {
    let start = buf.as_ptr() as usize;
    let end = start + buf.len();
    if buf.is_empty() || (start >= SRAM_LOWER && end < SRAM_UPPER) {
        Ok(())
    } else {
        Err(Error::BufferNotInRam)
    }
}
