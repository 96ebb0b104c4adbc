use soroban_sdk::{contracttype, Address, Bytes, String};

/// Payload produced by the registrar on the source chain. Field names and
/// types must match `registrar::NameRecord`; the XDR layout is checked by
/// [`is_name_record`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameRecord {
    pub name: String,
    pub owner: Address,
}

const SCV_STRING: u32 = 14;
const SCV_SYMBOL: u32 = 15;
const SCV_MAP: u32 = 17;
const SCV_ADDRESS: u32 = 18;

const SC_ADDRESS_ACCOUNT: u32 = 0;
const SC_ADDRESS_CONTRACT: u32 = 1;
const PUBLIC_KEY_ED25519: u32 = 0;

struct Reader<'a> {
    data: &'a Bytes,
    pos: u32,
}

impl<'a> Reader<'a> {
    fn u32(&mut self) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            value = (value << 8) | u32::from(self.data.get(self.pos)?);
            self.pos += 1;
        }
        Some(value)
    }

    fn expect_u32(&mut self, expected: u32) -> Option<()> {
        (self.u32()? == expected).then_some(())
    }

    /// Skips `len` bytes plus XDR padding, which must be zero.
    fn opaque(&mut self, len: u32) -> Option<u32> {
        let start = self.pos;
        let padded = len.checked_add(3)? & !3;
        let end = start.checked_add(padded)?;
        if end > self.data.len() {
            return None;
        }
        for i in start + len..end {
            if self.data.get(i)? != 0 {
                return None;
            }
        }
        self.pos = end;
        Some(start)
    }

    fn symbol(&mut self, expected: &[u8]) -> Option<()> {
        self.expect_u32(SCV_SYMBOL)?;
        self.expect_u32(expected.len() as u32)?;
        let start = self.opaque(expected.len() as u32)?;
        for (i, byte) in expected.iter().enumerate() {
            if self.data.get(start + i as u32)? != *byte {
                return None;
            }
        }
        Some(())
    }

    fn string(&mut self) -> Option<()> {
        self.expect_u32(SCV_STRING)?;
        let len = self.u32()?;
        self.opaque(len).map(|_| ())
    }

    fn address(&mut self) -> Option<()> {
        self.expect_u32(SCV_ADDRESS)?;
        match self.u32()? {
            SC_ADDRESS_ACCOUNT => self.expect_u32(PUBLIC_KEY_ED25519)?,
            SC_ADDRESS_CONTRACT => {}
            _ => return None,
        }
        self.opaque(32).map(|_| ())
    }
}

/// Whether `data` is exactly the XDR of a `NameRecord`: a two-entry map
/// `{name: String, owner: Address}` with nothing trailing.
///
/// The host traps on bytes that are not well-formed XDR instead of
/// returning an error, so payloads are checked before decoding.
pub fn is_name_record(data: &Bytes) -> bool {
    let mut reader = Reader { data, pos: 0 };
    let framed = (|| {
        reader.expect_u32(SCV_MAP)?;
        reader.expect_u32(1)?;
        reader.expect_u32(2)?;
        reader.symbol(b"name")?;
        reader.string()?;
        reader.symbol(b"owner")?;
        reader.address()
    })();
    framed.is_some() && reader.pos == data.len()
}
