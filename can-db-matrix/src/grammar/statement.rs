//! Statement grammar for the DBC interchange format
//!
//! One top-level alternative per section keyword, so a grammar mismatch is
//! localized to a single offending statement and its line. The parser is
//! total over the accepted keywords; anything else at the top level is a hard
//! error rather than a silent skip, since an unknown construct usually means
//! a corrupted or truncated export.

use crate::grammar::scanner::Scanner;
use crate::types::{ByteOrder, DatabaseError, MultiplexRole, Result, ValueType};

/// One classified top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `VERSION "<string>"`
    Version(String),
    /// `NS_ : <symbol>*` — content consumed, not interpreted
    SymbolTable(Vec<String>),
    /// `BS_ :` — bit timing stub
    BitTiming,
    /// `BU_ : <ecu>*`
    Ecus(Vec<String>),
    /// `BO_` header plus its nested `SG_` declarations
    Message(MessageStmt),
    /// `CM_ ...`
    Comment(CommentStmt),
    /// `BA_DEF_ ...` — recognized and retained, not applied to the model
    AttributeDefinition(AttributeDefinition),
    /// `BA_DEF_DEF_ "<name>" ...`
    AttributeDefault(String),
    /// `BA_DEF_REF_ "<name>" ...`
    AttributeReference(String),
    /// `BA_ "<name>" ...`
    AttributeValue(String),
    /// `VAL_TABLE_ <name> (<int> "<label>")* ;`
    NamedValueTable {
        name: String,
        entries: Vec<(i64, String)>,
    },
    /// `SIG_VALTYPE_ <id> <signal> : <type> ;`
    SignalValueType {
        message_id: u32,
        signal: String,
        declared: i64,
    },
    /// `VAL_ <id> <signal> (<int> "<label>")* ;`
    SignalValueTable {
        message_id: u32,
        signal: String,
        entries: Vec<(i64, String)>,
    },
}

/// A message frame declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MessageStmt {
    pub id: u32,
    pub name: String,
    pub dlc: u16,
    pub transmitter: String,
    pub signals: Vec<SignalStmt>,
    pub line: usize,
}

/// A signal declaration nested in a message
#[derive(Debug, Clone, PartialEq)]
pub struct SignalStmt {
    pub name: String,
    pub multiplex: MultiplexRole,
    pub start_bit: u16,
    pub length_bit: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    pub factor: f64,
    pub offset: f64,
    pub value_min: f64,
    pub value_max: f64,
    pub unit: String,
    pub receivers: Vec<String>,
    pub line: usize,
}

/// A free-standing comment statement
#[derive(Debug, Clone, PartialEq)]
pub enum CommentStmt {
    /// `CM_ BO_ <id> "<text>" ;`
    Message { message_id: u32, text: String },
    /// `CM_ SG_ <id> <signal> "<text>" ;`
    Signal {
        message_id: u32,
        signal: String,
        text: String,
    },
    /// `CM_ BU_ <node> "<text>" ;` — references no message, discarded
    Node { node: String, text: String },
    /// `CM_ "<text>" ;` — file-level comment, discarded
    File(String),
}

/// An attribute definition (`BA_DEF_`), parsed structurally
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    /// `BU_`, `BO_`, `SG_` or `EV_`; absent for network-level attributes
    pub object: Option<String>,
    pub name: String,
    pub value_type: AttributeValueType,
}

/// Declared type of an attribute definition.
/// Bounds are kept as floats; vendor exports mix integer and decimal forms.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValueType {
    Int { min: f64, max: f64 },
    Hex { min: f64, max: f64 },
    Float { min: f64, max: f64 },
    Enum(Vec<String>),
    String,
}

/// Parse the full text of one database file into classified statements
pub fn parse(text: &str) -> Result<Vec<Statement>> {
    // Vendor exports occasionally lead with a byte-order mark.
    let mut scanner = Scanner::new(text.trim_start_matches('\u{feff}'));
    let mut statements = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.at_eof() {
            break;
        }
        let line = scanner.line();
        let keyword = scanner.next_word()?;
        let statement = match keyword.as_str() {
            "VERSION" => Statement::Version(scanner.next_quoted()?),
            "NS_" => parse_symbol_table(&mut scanner)?,
            "BS_" => parse_bit_timing(&mut scanner)?,
            "BU_" => parse_ecus(&mut scanner)?,
            "BO_" => Statement::Message(parse_message(&mut scanner, line)?),
            "CM_" => Statement::Comment(parse_comment(&mut scanner)?),
            "BA_DEF_" => Statement::AttributeDefinition(parse_attribute_definition(&mut scanner)?),
            "BA_DEF_DEF_" => parse_attribute_default(&mut scanner, false)?,
            "BA_DEF_REF_" => parse_attribute_default(&mut scanner, true)?,
            "BA_" => {
                let name = scanner.next_quoted()?;
                scanner.consume_statement_body()?;
                Statement::AttributeValue(name)
            }
            "VAL_TABLE_" => parse_named_value_table(&mut scanner)?,
            "SIG_VALTYPE_" => parse_signal_value_type(&mut scanner)?,
            "VAL_" => parse_signal_value_table(&mut scanner)?,
            other => {
                return Err(DatabaseError::parse(
                    line,
                    format!("unrecognized statement keyword `{}`", other),
                ))
            }
        };
        statements.push(statement);
    }

    Ok(statements)
}

fn parse_symbol_table(scanner: &mut Scanner) -> Result<Statement> {
    scanner.expect_char(':')?;
    let mut symbols = Vec::new();
    // Symbol entries are bare keywords alone on their line; the first word
    // with trailing content on its line starts the next statement.
    while let Some(symbol) = scanner.next_lone_word() {
        symbols.push(symbol);
    }
    Ok(Statement::SymbolTable(symbols))
}

fn parse_bit_timing(scanner: &mut Scanner) -> Result<Statement> {
    scanner.expect_char(':')?;
    // Baud rate details, when present, sit on the same line; they carry no
    // message or signal information.
    if !scanner.at_line_end() {
        scanner.skip_line();
    }
    Ok(Statement::BitTiming)
}

fn parse_ecus(scanner: &mut Scanner) -> Result<Statement> {
    scanner.expect_char(':')?;
    let mut ecus = Vec::new();
    while !scanner.at_line_end() {
        ecus.push(scanner.next_word()?);
    }
    Ok(Statement::Ecus(ecus))
}

fn parse_message(scanner: &mut Scanner, line: usize) -> Result<MessageStmt> {
    let id = scanner.next_u32()?;
    let name = scanner.next_word()?;
    scanner.expect_char(':')?;
    let dlc = scanner.next_u16()?;
    let transmitter = scanner.next_word()?;

    let mut signals = Vec::new();
    while scanner.peek_word().as_deref() == Some("SG_") {
        scanner.next_word()?;
        signals.push(parse_signal(scanner)?);
    }

    Ok(MessageStmt {
        id,
        name,
        dlc,
        transmitter,
        signals,
        line,
    })
}

fn parse_signal(scanner: &mut Scanner) -> Result<SignalStmt> {
    let line = scanner.line();
    let name = scanner.next_word()?;

    let multiplex = if scanner.eat_char(':') {
        MultiplexRole::Normal
    } else {
        let marker = scanner.next_word()?;
        let role = parse_multiplex_marker(&marker, line)?;
        scanner.expect_char(':')?;
        role
    };

    let start_bit = scanner.next_u16()?;
    scanner.expect_char('|')?;
    let length_bit = scanner.next_u16()?;
    scanner.expect_char('@')?;
    let (byte_order, value_type) = parse_layout_code(scanner)?;

    scanner.expect_char('(')?;
    let factor = scanner.next_float()?;
    scanner.expect_char(',')?;
    let offset = scanner.next_float()?;
    scanner.expect_char(')')?;

    scanner.expect_char('[')?;
    let value_min = scanner.next_float()?;
    scanner.expect_char('|')?;
    let value_max = scanner.next_float()?;
    scanner.expect_char(']')?;

    let unit = scanner.next_quoted()?;

    let mut receivers = vec![scanner.next_word()?];
    while scanner.eat_char(',') {
        receivers.push(scanner.next_word()?);
    }

    Ok(SignalStmt {
        name,
        multiplex,
        start_bit,
        length_bit,
        byte_order,
        value_type,
        factor,
        offset,
        value_min,
        value_max,
        unit,
        receivers,
        line,
    })
}

/// `M` is the multiplexor; `m<N>` is multiplexed with selector N. Anything
/// else between the signal name and the colon is malformed.
fn parse_multiplex_marker(marker: &str, line: usize) -> Result<MultiplexRole> {
    if marker == "M" {
        return Ok(MultiplexRole::Multiplexor);
    }
    if let Some(digits) = marker.strip_prefix('m') {
        if let Ok(selector) = digits.parse::<u32>() {
            return Ok(MultiplexRole::Multiplexed(selector));
        }
    }
    Err(DatabaseError::parse(
        line,
        format!("invalid multiplex marker `{}`", marker),
    ))
}

/// The two characters after `@`: byte order digit, then sign
fn parse_layout_code(scanner: &mut Scanner) -> Result<(ByteOrder, ValueType)> {
    let line = scanner.line();
    let order = if scanner.eat_char('0') {
        ByteOrder::BigEndian
    } else if scanner.eat_char('1') {
        ByteOrder::LittleEndian
    } else {
        return Err(DatabaseError::parse(
            line,
            "expected byte order code `0` or `1`",
        ));
    };
    let sign = if scanner.eat_char('+') {
        ValueType::Unsigned
    } else if scanner.eat_char('-') {
        ValueType::Signed
    } else {
        return Err(DatabaseError::parse(line, "expected `+` or `-` sign code"));
    };
    Ok((order, sign))
}

fn parse_comment(scanner: &mut Scanner) -> Result<CommentStmt> {
    scanner.skip_whitespace();
    if scanner.peek() == Some('"') {
        let text = scanner.next_quoted()?;
        scanner.expect_char(';')?;
        return Ok(CommentStmt::File(text));
    }

    let line = scanner.line();
    let target = scanner.next_word()?;
    let comment = match target.as_str() {
        "BO_" => {
            let message_id = scanner.next_u32()?;
            let text = scanner.next_quoted()?;
            CommentStmt::Message { message_id, text }
        }
        "SG_" => {
            let message_id = scanner.next_u32()?;
            let signal = scanner.next_word()?;
            let text = scanner.next_quoted()?;
            CommentStmt::Signal {
                message_id,
                signal,
                text,
            }
        }
        "BU_" => {
            let node = scanner.next_word()?;
            let text = scanner.next_quoted()?;
            CommentStmt::Node { node, text }
        }
        other => {
            return Err(DatabaseError::parse(
                line,
                format!("invalid comment target `{}`", other),
            ))
        }
    };
    scanner.expect_char(';')?;
    Ok(comment)
}

fn parse_attribute_definition(scanner: &mut Scanner) -> Result<AttributeDefinition> {
    scanner.skip_whitespace();
    let object = if scanner.peek() == Some('"') {
        None
    } else {
        let line = scanner.line();
        let word = scanner.next_word()?;
        match word.as_str() {
            "BU_" | "BO_" | "SG_" | "EV_" => Some(word),
            other => {
                return Err(DatabaseError::parse(
                    line,
                    format!("invalid attribute object `{}`", other),
                ))
            }
        }
    };
    let name = scanner.next_quoted()?;

    let line = scanner.line();
    let kind = scanner.next_word()?;
    let value_type = match kind.as_str() {
        "INT" => {
            let min = scanner.next_float()?;
            let max = scanner.next_float()?;
            AttributeValueType::Int { min, max }
        }
        "HEX" => {
            let min = scanner.next_float()?;
            let max = scanner.next_float()?;
            AttributeValueType::Hex { min, max }
        }
        "FLOAT" => {
            let min = scanner.next_float()?;
            let max = scanner.next_float()?;
            AttributeValueType::Float { min, max }
        }
        "ENUM" => {
            let mut choices = Vec::new();
            loop {
                scanner.skip_whitespace();
                if scanner.peek() != Some('"') {
                    break;
                }
                choices.push(scanner.next_quoted()?);
                scanner.eat_char(',');
            }
            AttributeValueType::Enum(choices)
        }
        "STRING" => AttributeValueType::String,
        other => {
            return Err(DatabaseError::parse(
                line,
                format!("invalid attribute value type `{}`", other),
            ))
        }
    };
    scanner.expect_char(';')?;

    Ok(AttributeDefinition {
        object,
        name,
        value_type,
    })
}

fn parse_attribute_default(scanner: &mut Scanner, reference: bool) -> Result<Statement> {
    let name = scanner.next_quoted()?;
    scanner.skip_whitespace();
    if scanner.peek() == Some('"') {
        scanner.next_quoted()?;
    } else {
        scanner.next_float()?;
    }
    scanner.expect_char(';')?;
    Ok(if reference {
        Statement::AttributeReference(name)
    } else {
        Statement::AttributeDefault(name)
    })
}

fn parse_named_value_table(scanner: &mut Scanner) -> Result<Statement> {
    let name = scanner.next_word()?;
    let entries = parse_value_entries(scanner)?;
    Ok(Statement::NamedValueTable { name, entries })
}

fn parse_signal_value_type(scanner: &mut Scanner) -> Result<Statement> {
    let message_id = scanner.next_u32()?;
    let signal = scanner.next_word()?;
    scanner.expect_char(':')?;
    let declared = scanner.next_i64()?;
    scanner.expect_char(';')?;
    Ok(Statement::SignalValueType {
        message_id,
        signal,
        declared,
    })
}

fn parse_signal_value_table(scanner: &mut Scanner) -> Result<Statement> {
    let message_id = scanner.next_u32()?;
    let signal = scanner.next_word()?;
    let entries = parse_value_entries(scanner)?;
    Ok(Statement::SignalValueTable {
        message_id,
        signal,
        entries,
    })
}

/// `(<int> "<label>")*` through the terminating `;`, order preserved
fn parse_value_entries(scanner: &mut Scanner) -> Result<Vec<(i64, String)>> {
    let mut entries = Vec::new();
    while !scanner.eat_char(';') {
        let raw = scanner.next_i64()?;
        let label = scanner.next_quoted()?;
        entries.push((raw, label));
    }
    Ok(entries)
}
