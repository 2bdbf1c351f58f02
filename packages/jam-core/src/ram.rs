//! Page-granular PVM address space.
//!
//! Four regions, page-aligned: read-only data at [`RO_DATA_BASE`], writable
//! data one zone above the RO region, heap immediately above that (grown
//! upward by `sbrk`), and the stack below [`STACK_TOP`], ending at the return
//! sentinel. Accesses of widths 1/2/4/8 are little-endian; unaligned access
//! within mapped pages is permitted; any touch of an unmapped page faults
//! with that page's base address.

use std::collections::HashMap;

use crate::config::{
    align_to_page, align_to_zone, ARGS_BASE, ARGS_CAPACITY, PAGE_SIZE, RO_DATA_BASE, STACK_TOP,
    ZONE_SIZE,
};
use crate::parser::Program;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageAccess {
    ReadOnly,
    ReadWrite,
}

/// Address of the fault: the base of the first unmapped or protected page.
pub type FaultAddress = u32;

#[derive(Clone, Debug, Default)]
pub struct Memory {
    pages: HashMap<u32, Vec<u8>>,
    access: HashMap<u32, PageAccess>,
    heap_end: u32,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard layout for a program: RO data, RW data, initial
    /// heap, stack.
    #[must_use]
    pub fn for_program(program: &Program) -> Self {
        let mut memory = Self::new();
        let ro_len = program.ro_data.len() as u32;
        let rw_len = program.rw_data.len() as u32;

        memory.map_region(
            RO_DATA_BASE,
            align_to_page(ro_len),
            PageAccess::ReadOnly,
            &program.ro_data,
        );

        let rw_base = align_to_zone(RO_DATA_BASE + ro_len) + ZONE_SIZE;
        let heap_base = rw_base + align_to_page(rw_len);
        memory.map_region(
            rw_base,
            align_to_page(rw_len) + align_to_page(program.heap_size),
            PageAccess::ReadWrite,
            &program.rw_data,
        );
        memory.heap_end = heap_base + align_to_page(program.heap_size);

        let stack_len = align_to_page(program.stack_size);
        memory.map_region(STACK_TOP - stack_len, stack_len, PageAccess::ReadWrite, &[]);

        memory
    }

    /// Map the read-only argument region. Arguments beyond the region
    /// capacity are the caller's bug; the region is sized to fit.
    pub fn map_args(&mut self, args: &[u8]) {
        debug_assert!(args.len() as u32 <= ARGS_CAPACITY);
        self.map_region(
            ARGS_BASE,
            align_to_page(args.len() as u32),
            PageAccess::ReadOnly,
            args,
        );
    }

    /// Map `size` bytes at `base` (both page-aligned) and seed `contents`.
    pub fn map_region(&mut self, base: u32, size: u32, access: PageAccess, contents: &[u8]) {
        let first = base / PAGE_SIZE;
        let last = (u64::from(base) + u64::from(size)).div_ceil(u64::from(PAGE_SIZE)) as u32;
        for page in first..last {
            self.pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize]);
            self.access.insert(page, access);
        }
        self.write_unchecked(base, contents);
    }

    fn check(&self, address: u32, size: u32, write: bool) -> Result<(), FaultAddress> {
        if size == 0 {
            return Ok(());
        }
        let end = u64::from(address) + u64::from(size);
        if end > 1 << 32 {
            return Err(address);
        }
        let first = address / PAGE_SIZE;
        let last = ((end - 1) / u64::from(PAGE_SIZE)) as u32;
        for page in first..=last {
            match self.access.get(&page) {
                Some(PageAccess::ReadWrite) => {}
                Some(PageAccess::ReadOnly) if !write => {}
                _ => return Err(page * PAGE_SIZE),
            }
        }
        Ok(())
    }

    pub fn read(&self, address: u32, count: u32) -> Result<Vec<u8>, FaultAddress> {
        self.check(address, count, false)?;
        let mut out = vec![0u8; count as usize];
        let mut copied = 0usize;
        while copied < count as usize {
            let addr = address + copied as u32;
            let page = &self.pages[&(addr / PAGE_SIZE)];
            let offset = (addr % PAGE_SIZE) as usize;
            let chunk = (count as usize - copied).min(PAGE_SIZE as usize - offset);
            out[copied..copied + chunk].copy_from_slice(&page[offset..offset + chunk]);
            copied += chunk;
        }
        Ok(out)
    }

    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FaultAddress> {
        self.check(address, data.len() as u32, true)?;
        self.write_unchecked(address, data);
        Ok(())
    }

    fn write_unchecked(&mut self, address: u32, data: &[u8]) {
        let mut copied = 0usize;
        while copied < data.len() {
            let addr = address + copied as u32;
            let page = self
                .pages
                .entry(addr / PAGE_SIZE)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize]);
            let offset = (addr % PAGE_SIZE) as usize;
            let chunk = (data.len() - copied).min(PAGE_SIZE as usize - offset);
            page[offset..offset + chunk].copy_from_slice(&data[copied..copied + chunk]);
            copied += chunk;
        }
    }

    /// Little-endian load of 1, 2, 4 or 8 bytes.
    pub fn load(&self, address: u32, width: u32) -> Result<u64, FaultAddress> {
        let bytes = self.read(address, width)?;
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Little-endian store of the low `width` bytes of `value`.
    pub fn store(&mut self, address: u32, value: u64, width: u32) -> Result<(), FaultAddress> {
        self.write(address, &value.to_le_bytes()[..width as usize])
    }

    /// Grow the heap by `pages` pages; returns the new upper bound.
    pub fn sbrk(&mut self, pages: u32) -> u32 {
        let grown = pages.saturating_mul(PAGE_SIZE);
        self.map_region(self.heap_end, grown, PageAccess::ReadWrite, &[]);
        self.heap_end = self.heap_end.saturating_add(grown);
        self.heap_end
    }

    #[must_use]
    pub fn heap_end(&self) -> u32 {
        self.heap_end
    }
}
