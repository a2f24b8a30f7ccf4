use solana_sdk::pubkey::Pubkey;

use crate::error::CodecError;
use crate::schema::{AccountDef, FieldDef, FieldKind, Schema};

/// A typed argument or decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U8(u8),
    U64(u64),
    I64(i64),
    Bool(bool),
    Pubkey(Pubkey),
}

impl Value {
    fn kind(&self) -> FieldKind {
        match self {
            Value::U8(_) => FieldKind::U8,
            Value::U64(_) => FieldKind::U64,
            Value::I64(_) => FieldKind::I64,
            Value::Bool(_) => FieldKind::Bool,
            Value::Pubkey(_) => FieldKind::Pubkey,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Value::U8(v) => out.push(*v),
            Value::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::Pubkey(v) => out.extend_from_slice(v.as_ref()),
        }
    }

    fn zero(kind: FieldKind) -> Value {
        match kind {
            FieldKind::U8 => Value::U8(0),
            FieldKind::U64 => Value::U64(0),
            FieldKind::I64 => Value::I64(0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Pubkey => Value::Pubkey(Pubkey::default()),
        }
    }
}

/// Encodes `op` with the given named arguments into the program's binary
/// payload. Total for any argument set matching the schema; anything else is
/// a `SchemaMismatch`, never a malformed payload.
pub fn encode_instruction(
    schema: &Schema,
    op: &str,
    args: &[(&str, Value)],
) -> Result<Vec<u8>, CodecError> {
    let def = schema
        .operation(op)
        .ok_or_else(|| CodecError::SchemaMismatch(format!("unknown operation `{op}`")))?;

    if args.len() != def.args.len() {
        return Err(CodecError::SchemaMismatch(format!(
            "`{op}` takes {} argument(s), got {}",
            def.args.len(),
            args.len()
        )));
    }

    let mut data = Vec::with_capacity(8 + payload_len(&def.args));
    data.extend_from_slice(&def.discriminator);
    for field in &def.args {
        let value = args
            .iter()
            .find(|(name, _)| *name == field.name)
            .map(|(_, v)| v)
            .ok_or_else(|| {
                CodecError::SchemaMismatch(format!("`{op}` missing argument `{}`", field.name))
            })?;
        if value.kind() != field.kind {
            return Err(CodecError::SchemaMismatch(format!(
                "`{op}` argument `{}` expects {:?}, got {:?}",
                field.name,
                field.kind,
                value.kind()
            )));
        }
        value.write(&mut data);
    }
    Ok(data)
}

/// Inverse of [`encode_instruction`]: resolves the discriminator and decodes
/// the argument record in schema order.
pub fn decode_instruction(
    schema: &Schema,
    data: &[u8],
) -> Result<(&'static str, Vec<(&'static str, Value)>), CodecError> {
    let disc = read_discriminator(data)?;
    let def = schema
        .operation_by_discriminator(&disc)
        .ok_or_else(|| {
            CodecError::SchemaMismatch(format!("unknown instruction discriminator {disc:02x?}"))
        })?;

    let mut cursor = Cursor::new(&data[8..]);
    let mut args = Vec::with_capacity(def.args.len());
    for field in &def.args {
        args.push((field.name, cursor.read(field)?));
    }
    if !cursor.is_empty() {
        return Err(CodecError::SchemaMismatch(format!(
            "`{}` payload has {} trailing byte(s)",
            def.name,
            cursor.remaining()
        )));
    }
    Ok((def.name, args))
}

/// Decoded account data: which layout matched, plus its fields in order.
/// Trailing optional fields absent from older data come back as defaults.
#[derive(Debug, Clone)]
pub struct DecodedAccount {
    pub name: &'static str,
    pub fields: Vec<(&'static str, Value)>,
}

impl DecodedAccount {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Decodes raw account bytes against whichever layout the discriminator
/// names. An unrecognized discriminator is refused outright.
pub fn decode_account(schema: &Schema, data: &[u8]) -> Result<DecodedAccount, CodecError> {
    let disc = read_discriminator(data)?;
    let def = schema
        .account_by_discriminator(&disc)
        .ok_or(CodecError::UnknownDiscriminator(disc))?;
    decode_account_as(def, data)
}

pub fn decode_account_as(def: &AccountDef, data: &[u8]) -> Result<DecodedAccount, CodecError> {
    if data.len() < def.min_len() {
        return Err(CodecError::TruncatedData {
            needed: def.min_len(),
            got: data.len(),
        });
    }
    let disc = read_discriminator(data)?;
    if disc != def.discriminator {
        return Err(CodecError::UnknownDiscriminator(disc));
    }

    let required = def.fields.len() - def.optional_tail;
    let mut cursor = Cursor::new(&data[8..]);
    let mut fields = Vec::with_capacity(def.fields.len());
    for (i, field) in def.fields.iter().enumerate() {
        if i >= required && cursor.remaining() < field.kind.byte_len() {
            fields.push((field.name, Value::zero(field.kind)));
            continue;
        }
        fields.push((field.name, cursor.read(field)?));
    }
    Ok(DecodedAccount {
        name: def.name,
        fields,
    })
}

fn read_discriminator(data: &[u8]) -> Result<[u8; 8], CodecError> {
    if data.len() < 8 {
        return Err(CodecError::TruncatedData {
            needed: 8,
            got: data.len(),
        });
    }
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&data[..8]);
    Ok(disc)
}

fn payload_len(fields: &[FieldDef]) -> usize {
    fields.iter().map(|f| f.kind.byte_len()).sum()
}

struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read(&mut self, field: &FieldDef) -> Result<Value, CodecError> {
        let len = field.kind.byte_len();
        if self.remaining() < len {
            return Err(CodecError::TruncatedData {
                needed: 8 + self.offset + len,
                got: 8 + self.data.len(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(match field.kind {
            FieldKind::U8 => Value::U8(bytes[0]),
            FieldKind::Bool => Value::Bool(bytes[0] != 0),
            FieldKind::U64 => Value::U64(u64::from_le_bytes(bytes.try_into().unwrap())),
            FieldKind::I64 => Value::I64(i64::from_le_bytes(bytes.try_into().unwrap())),
            FieldKind::Pubkey => {
                Value::Pubkey(Pubkey::try_from(bytes).expect("pubkey field is 32 bytes"))
            }
        })
    }
}
