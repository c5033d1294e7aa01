//! Placeholder token parser
//!
//! Grammar: `#<kind>:<ref>` where kind is one of `number`, `string`,
//! `date`, `objid` or `data.<op>`. The `#` prefix is reserved; every string
//! leaf starting with it is parsed as a placeholder.

use super::errors::{PlaceholderError, PlaceholderResult};

/// Prefix marking a placeholder string
pub const PREFIX: char = '#';

/// Operator of a `data` placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOp {
    /// `*`: the field from every saved document
    All,
    /// The field from the document at this index
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Number,
    String,
    Date,
    ObjectId,
    Data(DataOp),
}

/// A parsed placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    /// Variable name, or `<key>.<field>` for data placeholders
    pub reference: String,
    /// Original token, used in error messages
    pub raw: String,
}

impl Placeholder {
    /// True when `value` must be treated as a placeholder
    pub fn is_placeholder(value: &str) -> bool {
        value.starts_with(PREFIX)
    }

    /// Parse a placeholder token
    pub fn parse(token: &str) -> PlaceholderResult<Self> {
        let body = token
            .strip_prefix(PREFIX)
            .ok_or_else(|| PlaceholderError::Malformed(token.to_string()))?;

        let (kind, reference) = body
            .split_once(':')
            .ok_or_else(|| PlaceholderError::Malformed(token.to_string()))?;

        let kind = match kind {
            "number" => PlaceholderKind::Number,
            "string" => PlaceholderKind::String,
            "date" => PlaceholderKind::Date,
            "objid" => PlaceholderKind::ObjectId,
            "data" => return Err(PlaceholderError::MissingOperator(token.to_string())),
            other => match other.strip_prefix("data.") {
                Some("") => return Err(PlaceholderError::MissingOperator(token.to_string())),
                Some(op) => PlaceholderKind::Data(parse_op(op, token)?),
                None => return Err(PlaceholderError::UnknownCommand(other.to_string())),
            },
        };

        let placeholder = Self {
            kind,
            reference: reference.to_string(),
            raw: token.to_string(),
        };

        if placeholder.is_data() {
            placeholder.data_ref()?;
        }

        Ok(placeholder)
    }

    pub fn is_data(&self) -> bool {
        matches!(self.kind, PlaceholderKind::Data(_))
    }

    /// Split a data reference into saved key and field path at the first `.`
    pub fn data_ref(&self) -> PlaceholderResult<(&str, &str)> {
        match self.reference.split_once('.') {
            Some((key, field)) if !key.is_empty() && !field.is_empty() => Ok((key, field)),
            _ => Err(PlaceholderError::InvalidDataReference(self.reference.clone())),
        }
    }
}

fn parse_op(op: &str, token: &str) -> PlaceholderResult<DataOp> {
    if op == "*" {
        return Ok(DataOp::All);
    }
    op.parse::<usize>()
        .map(DataOp::Index)
        .map_err(|_| PlaceholderError::InvalidOperator {
            op: op.to_string(),
            token: token.to_string(),
        })
}
