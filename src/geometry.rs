//! Virtual/physical address decomposition shared by the page table and the
//! translator: page offset bits, and the two-level VPN → (L1, L2) split.

/// Virtual page number.
pub type Vpn = u32;
/// Physical frame number.
pub type Pfn = u32;

/// Returned by the translator when no physical address could be produced.
pub const TRANSLATION_FAILED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
pub struct AddressGeometry {
    pub page_size: u32,
    pub page_offset_bits: u32,
    pub offset_mask: u32,
    pub vpn_bits: u32,
    pub l1_bits: u32,
    pub l2_bits: u32,
    /// Number of addressable virtual pages, i.e. `address_space_size / page_size`.
    pub address_space_pages: u64,
}

impl AddressGeometry {
    /// Builds the geometry for a given page size and virtual address width.
    ///
    /// `page_size` must be a power of two; `address_bits` must be strictly
    /// greater than `log2(page_size)` so that at least one VPN bit exists.
    pub fn new(page_size: u32, address_bits: u32) -> Option<Self> {
        if page_size == 0 || !page_size.is_power_of_two() {
            return None;
        }
        let page_offset_bits = page_size.trailing_zeros();
        if address_bits <= page_offset_bits || address_bits > 32 {
            return None;
        }
        // vpn_bits = address_bits - page_offset_bits: the remaining bits
        // above the offset, not a subtraction against the full address space.
        let vpn_bits = address_bits - page_offset_bits;
        let l2_bits = vpn_bits.div_ceil(2);
        let l1_bits = vpn_bits - l2_bits;
        Some(Self {
            page_size,
            page_offset_bits,
            offset_mask: page_size - 1,
            vpn_bits,
            l1_bits,
            l2_bits,
            address_space_pages: 1u64 << vpn_bits,
        })
    }

    pub fn vpn_of(&self, va: u32) -> Vpn {
        va >> self.page_offset_bits
    }

    pub fn offset_of(&self, va: u32) -> u32 {
        va & self.offset_mask
    }

    pub fn compose(&self, pfn: Pfn, offset: u32) -> u32 {
        (pfn << self.page_offset_bits) | offset
    }

    pub fn is_valid_vpn(&self, vpn: Vpn) -> bool {
        (vpn as u64) < self.address_space_pages
    }

    pub fn l1_index(&self, vpn: Vpn) -> u32 {
        vpn >> self.l2_bits
    }

    pub fn l2_index(&self, vpn: Vpn) -> u32 {
        vpn & ((1u32 << self.l2_bits) - 1)
    }

    pub fn l1_l2(&self, vpn: Vpn) -> (u32, u32) {
        (self.l1_index(vpn), self.l2_index(vpn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_4k_32bit_geometry() {
        let geo = AddressGeometry::new(4096, 32).unwrap();
        assert_eq!(geo.page_offset_bits, 12);
        assert_eq!(geo.vpn_bits, 20);
        assert_eq!(geo.l2_bits, 10);
        assert_eq!(geo.l1_bits, 10);
        assert_eq!(geo.address_space_pages, 1 << 20);
    }

    #[test]
    fn vpn_and_offset_round_trip() {
        let geo = AddressGeometry::new(4096, 32).unwrap();
        let va = 0x0000_9abc;
        assert_eq!(geo.vpn_of(va), 0x9);
        assert_eq!(geo.offset_of(va), 0xabc);
    }

    #[test]
    fn l1_l2_recombine_into_vpn() {
        let geo = AddressGeometry::new(4096, 32).unwrap();
        let vpn: Vpn = 0x1_2345;
        let (l1, l2) = geo.l1_l2(vpn);
        assert_eq!((l1 << geo.l2_bits) | l2, vpn);
    }

    #[test]
    fn rejects_non_power_of_two_page_size() {
        assert!(AddressGeometry::new(4000, 32).is_none());
    }

    #[test]
    fn rejects_address_bits_not_exceeding_offset_bits() {
        assert!(AddressGeometry::new(4096, 12).is_none());
        assert!(AddressGeometry::new(4096, 8).is_none());
    }
}
