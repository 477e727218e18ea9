//! Attribute registry.
//!
//! One table row per attribute id: encoded size, the permission that guards
//! reads, the reader, and the writer for writable attributes. Read and write
//! handlers consult only this table, so sizes, permissions and accessors
//! cannot drift apart.

use bytes::{Buf, BufMut};
use msap_protocol::*;

use crate::error::StackError;
use crate::permission::Feature;
use crate::platform::{Platform, StackResult};

/// Reads an attribute into a buffer of exactly its encoded size.
pub type AttributeReader<P> = fn(&P, &mut [u8]) -> StackResult<()>;

/// Writes an attribute from a value of exactly its encoded size.
pub type AttributeWriter<P> = fn(&mut P, &[u8]) -> StackResult<()>;

/// One attribute of the registry.
pub struct AttributeDescriptor<P> {
    /// Attribute id.
    pub id: u16,
    /// Encoded size in bytes.
    pub size: usize,
    /// Permission required to read.
    pub read_feature: Feature,
    /// Reader.
    pub reader: AttributeReader<P>,
    /// Writer, for writable attributes.
    pub writer: Option<AttributeWriter<P>>,
}

impl<P> Clone for AttributeDescriptor<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for AttributeDescriptor<P> {}

impl<P> std::fmt::Debug for AttributeDescriptor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("read_feature", &self.read_feature)
            .field("writable", &self.writer.is_some())
            .finish()
    }
}

/// Number of attributes in the registry.
pub const ATTRIBUTE_COUNT: usize = 13;

/// The full registry, ordered by id.
pub fn registry<P: Platform>() -> [AttributeDescriptor<P>; ATTRIBUTE_COUNT] {
    let entry = |id: u16, size: usize, read_feature: Feature, reader: AttributeReader<P>| {
        AttributeDescriptor {
            id,
            size,
            read_feature,
            reader,
            writer: None,
        }
    };
    let writable = |id: u16, size: usize, reader: AttributeReader<P>, writer: AttributeWriter<P>| {
        AttributeDescriptor {
            id,
            size,
            read_feature: Feature::AttributeRead,
            reader,
            writer: Some(writer),
        }
    };

    [
        entry(ATTR_STACK_STATUS, 1, Feature::AttributeRead, read_stack_status),
        entry(ATTR_PDU_BUFFER_USAGE, 1, Feature::AttributeRead, read_pdu_usage),
        entry(ATTR_PDU_BUFFER_CAPACITY, 1, Feature::AttributeRead, read_pdu_capacity),
        entry(ATTR_NEIGHBOR_COUNT, 1, Feature::GetNeighbors, read_retired),
        writable(ATTR_ENERGY, 1, read_energy, write_energy),
        writable(ATTR_AUTOSTART, 1, read_autostart, write_autostart),
        entry(ATTR_ROUTE_COUNT, 1, Feature::GetNeighbors, read_route_count),
        entry(ATTR_SYSTEM_TIME, 4, Feature::AttributeRead, read_system_time),
        writable(ATTR_ACCESS_CYCLE_RANGE, 4, read_access_cycle_range, write_access_cycle_range),
        entry(ATTR_ACCESS_CYCLE_LIMITS, 4, Feature::AttributeRead, read_access_cycle_limits),
        entry(ATTR_CURRENT_ACCESS_CYCLE, 2, Feature::AttributeRead, read_current_access_cycle),
        entry(ATTR_SCRATCHPAD_BLOCK_MAX, 1, Feature::ScratchpadStatus, read_block_max),
        writable(ATTR_MULTICAST_GROUPS, MAX_ATTRIBUTE_SIZE, read_multicast, write_multicast),
    ]
}

/// Look up an attribute, or `None` if the id is outside the table.
pub fn lookup<P: Platform>(id: u16) -> Option<AttributeDescriptor<P>> {
    let idx = (id as usize).checked_sub(1)?;
    registry::<P>().get(idx).copied()
}

// ============================================================================
// Scalar Encoding
// ============================================================================

/// Write the low `buf.len()` bytes of `value`, little-endian.
fn put_scalar(buf: &mut [u8], value: u32) {
    let bytes = value.to_le_bytes();
    let len = buf.len().min(bytes.len());
    buf[..len].copy_from_slice(&bytes[..len]);
}

/// Read a little-endian scalar of up to four bytes.
fn get_scalar(value: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    let len = value.len().min(bytes.len());
    bytes[..len].copy_from_slice(&value[..len]);
    u32::from_le_bytes(bytes)
}

fn pack_range((min, max): (u16, u16)) -> u32 {
    u32::from(min) | (u32::from(max) << 16)
}

// ============================================================================
// Readers
// ============================================================================

fn read_stack_status<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    let flags = StackStateFlags::from(p.stack_state());
    put_scalar(buf, u32::from(flags.bits()));
    Ok(())
}

fn read_pdu_usage<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    let free = p.num_free_buffers()?;
    put_scalar(buf, p.num_buffers().saturating_sub(free) as u32);
    Ok(())
}

fn read_pdu_capacity<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, p.num_free_buffers()? as u32);
    Ok(())
}

fn read_retired<P: Platform>(_: &P, _: &mut [u8]) -> StackResult<()> {
    Err(StackError::NotImplemented)
}

fn read_energy<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, u32::from(p.energy()?));
    Ok(())
}

fn read_autostart<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, u32::from(p.autostart()));
    Ok(())
}

fn read_route_count<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, p.route_count()? as u32);
    Ok(())
}

// The real value is stamped by the pre-send step.
fn read_system_time<P: Platform>(_: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, 0);
    Ok(())
}

fn read_access_cycle_range<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, pack_range(p.access_cycle_range()?));
    Ok(())
}

fn read_access_cycle_limits<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, pack_range(p.access_cycle_limits()?));
    Ok(())
}

fn read_current_access_cycle<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, u32::from(p.access_cycle()?));
    Ok(())
}

fn read_block_max<P: Platform>(_: &P, buf: &mut [u8]) -> StackResult<()> {
    put_scalar(buf, SCRATCHPAD_BLOCK_MAX_BYTES as u32);
    Ok(())
}

fn read_multicast<P: Platform>(p: &P, buf: &mut [u8]) -> StackResult<()> {
    let groups = p.multicast_groups()?;
    let mut out = &mut buf[..];
    for slot in 0..MAX_MULTICAST_GROUPS {
        out.put_u32_le(groups.get(slot).copied().unwrap_or(0));
    }
    Ok(())
}

// ============================================================================
// Writers
// ============================================================================

fn write_energy<P: Platform>(p: &mut P, value: &[u8]) -> StackResult<()> {
    p.set_energy(get_scalar(value) as u8)
}

fn write_autostart<P: Platform>(p: &mut P, value: &[u8]) -> StackResult<()> {
    match get_scalar(value) {
        0 => p.set_autostart(false),
        1 => p.set_autostart(true),
        _ => Err(StackError::InvalidValue),
    }
}

fn write_access_cycle_range<P: Platform>(p: &mut P, value: &[u8]) -> StackResult<()> {
    let packed = get_scalar(value);
    p.set_access_cycle_range((packed & 0xFFFF) as u16, (packed >> 16) as u16)
}

fn write_multicast<P: Platform>(p: &mut P, value: &[u8]) -> StackResult<()> {
    let mut buf = value;
    let mut groups = Vec::with_capacity(MAX_MULTICAST_GROUPS);
    while buf.remaining() >= 4 {
        groups.push(buf.get_u32_le());
    }
    p.set_multicast_groups(&groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedNode;

    #[test]
    fn test_registry_matches_wire_sizes() {
        let table = registry::<SimulatedNode>();
        for (idx, descriptor) in table.iter().enumerate() {
            assert_eq!(descriptor.id as usize, idx + 1);
            assert_eq!(Some(descriptor.size), attribute_size(descriptor.id));
        }
    }

    #[test]
    fn test_lookup_out_of_range() {
        assert!(lookup::<SimulatedNode>(0).is_none());
        assert!(lookup::<SimulatedNode>(ATTRIBUTE_COUNT as u16 + 1).is_none());
        assert!(lookup::<SimulatedNode>(0xFFFF).is_none());
    }

    #[test]
    fn test_permission_buckets() {
        let feature = |id| lookup::<SimulatedNode>(id).unwrap().read_feature;
        assert_eq!(feature(ATTR_SCRATCHPAD_BLOCK_MAX), Feature::ScratchpadStatus);
        assert_eq!(feature(ATTR_NEIGHBOR_COUNT), Feature::GetNeighbors);
        assert_eq!(feature(ATTR_ROUTE_COUNT), Feature::GetNeighbors);
        assert_eq!(feature(ATTR_ENERGY), Feature::AttributeRead);
        assert_eq!(feature(ATTR_SYSTEM_TIME), Feature::AttributeRead);
    }

    #[test]
    fn test_writable_set() {
        let writable: Vec<u16> = registry::<SimulatedNode>()
            .iter()
            .filter(|d| d.writer.is_some())
            .map(|d| d.id)
            .collect();
        assert_eq!(
            writable,
            vec![ATTR_ENERGY, ATTR_AUTOSTART, ATTR_ACCESS_CYCLE_RANGE, ATTR_MULTICAST_GROUPS]
        );
    }

    #[test]
    fn test_scalar_helpers() {
        let mut buf = [0u8; 2];
        put_scalar(&mut buf, 0x0001_2345);
        assert_eq!(buf, [0x45, 0x23]);
        assert_eq!(get_scalar(&[0x45, 0x23]), 0x2345);
        assert_eq!(pack_range((2000, 8000)), 2000 | (8000 << 16));
    }
}
