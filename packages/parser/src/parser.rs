use crate::error::{ParseError, ParseResult};
use crate::schema::{FieldSchema, FieldType, MessageSchema};
use crate::tokenizer::{tokenize, Token};
use crate::value::{Message, Value};
use std::ops::Range;
use std::sync::Arc;

/// Parser for the text format
///
/// Text is merged into a message: a fresh, empty one for
/// [`Parser::parse_message`], or the caller's for [`Parser::merge_into`].
/// Singular fields that appear more than once keep the last value;
/// repeated fields accumulate in source order.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    /// Parse the whole input as the body of a message
    pub fn parse_message(&mut self, schema: &Arc<MessageSchema>) -> ParseResult<Message> {
        let mut message = Message::new(schema.clone());
        self.merge_into(&mut message)?;
        Ok(message)
    }

    /// Merge the whole input into an existing message
    pub fn merge_into(&mut self, message: &mut Message) -> ParseResult<()> {
        self.parse_fields_into(message, None)
    }

    /// Parse the whole input as one value of `field`
    pub fn parse_field_value(&mut self, field: &FieldSchema) -> ParseResult<Value> {
        let value = match &field.ty {
            FieldType::Message(schema) if !self.check(Token::LBrace) && !self.check(Token::LAngle) => {
                Value::Message(self.parse_message(schema)?)
            }
            _ => self.parse_value(field)?,
        };

        if let Some((token, span)) = self.peek() {
            return Err(ParseError::unexpected_token(
                span.start,
                "end of input",
                token.to_string(),
            ));
        }
        Ok(value)
    }

    fn parse_fields_into(&mut self, message: &mut Message, close: Option<Token<'src>>) -> ParseResult<()> {
        loop {
            match (self.peek(), close) {
                (None, None) => return Ok(()),
                (None, Some(close)) => {
                    return Err(ParseError::unexpected_eof(self.source.len(), close.to_string()));
                }
                (Some((token, _)), Some(close)) if same_kind(token, &close) => {
                    self.advance();
                    return Ok(());
                }
                _ => {}
            }

            self.parse_field(message)?;

            // Separators between fields are optional
            if !self.match_token(Token::Comma) {
                self.match_token(Token::Semicolon);
            }
        }
    }

    fn parse_field(&mut self, message: &mut Message) -> ParseResult<()> {
        let (name, name_pos) = self.expect_ident()?;
        let field = message
            .schema()
            .field(name)
            .cloned()
            .ok_or_else(|| ParseError::unknown_field(name_pos, message.type_name(), name))?;

        // The colon is optional before a message body
        let has_colon = self.match_token(Token::Colon);
        if !has_colon && !field.ty.is_message() {
            return Err(self.unexpected("':'"));
        }

        if self.check(Token::LBracket) {
            if !field.is_repeated() {
                return Err(ParseError::invalid_value(
                    self.peek_pos(),
                    &field.name,
                    "list syntax is only allowed for repeated fields",
                ));
            }
            for (value, pos) in self.parse_list(&field)? {
                Self::store(message, &field, value, pos)?;
            }
            return Ok(());
        }

        let pos = self.peek_pos();
        let value = self.parse_value(&field)?;
        Self::store(message, &field, value, pos)
    }

    fn store(message: &mut Message, field: &FieldSchema, value: Value, pos: usize) -> ParseResult<()> {
        let result = if field.is_repeated() {
            message.push(&field.name, value).map(|_| ())
        } else {
            message.set(&field.name, value).map(|_| ())
        };
        result.map_err(|e| ParseError::invalid_value(pos, &field.name, e.to_string()))
    }

    fn parse_list(&mut self, field: &FieldSchema) -> ParseResult<Vec<(Value, usize)>> {
        self.expect(Token::LBracket, "'['")?;
        let mut values = Vec::new();

        if self.match_token(Token::RBracket) {
            return Ok(values);
        }

        loop {
            let pos = self.peek_pos();
            values.push((self.parse_value(field)?, pos));

            if self.match_token(Token::Comma) {
                continue;
            }
            self.expect(Token::RBracket, "',' or ']'")?;
            return Ok(values);
        }
    }

    fn parse_value(&mut self, field: &FieldSchema) -> ParseResult<Value> {
        match &field.ty {
            FieldType::Message(schema) => {
                let close = if self.match_token(Token::LBrace) {
                    Token::RBrace
                } else if self.match_token(Token::LAngle) {
                    Token::RAngle
                } else {
                    return Err(self.unexpected("'{' or '<'"));
                };

                let mut nested = Message::new(schema.clone());
                self.parse_fields_into(&mut nested, Some(close))?;
                Ok(Value::Message(nested))
            }
            FieldType::String => self.parse_string().map(Value::String),
            FieldType::Bool => self.parse_bool(field),
            FieldType::Enum(schema) => {
                let pos = self.peek_pos();
                match self.peek() {
                    Some((Token::Ident(name), _)) => {
                        let name = *name;
                        self.advance();
                        schema
                            .value_by_name(name)
                            .map(|v| Value::Enum(v.name.clone()))
                            .ok_or_else(|| {
                                ParseError::invalid_value(
                                    pos,
                                    &field.name,
                                    format!("unknown value '{}' for enum {}", name, schema.name),
                                )
                            })
                    }
                    Some((Token::Number(text), _)) => {
                        let text = *text;
                        self.advance();
                        let number = parse_integer(text)
                            .and_then(|n| i32::try_from(n).ok())
                            .ok_or_else(|| ParseError::invalid_value(pos, &field.name, "expected enum number"))?;
                        schema
                            .value_by_number(number)
                            .map(|v| Value::Enum(v.name.clone()))
                            .ok_or_else(|| {
                                ParseError::invalid_value(
                                    pos,
                                    &field.name,
                                    format!("unknown number {} for enum {}", number, schema.name),
                                )
                            })
                    }
                    _ => Err(self.unexpected("enum value")),
                }
            }
            FieldType::Int32 | FieldType::Int64 | FieldType::UInt32 | FieldType::UInt64 => {
                self.parse_integer_value(field)
            }
            FieldType::Float | FieldType::Double => self.parse_float_value(field),
        }
    }

    fn parse_bool(&mut self, field: &FieldSchema) -> ParseResult<Value> {
        let pos = self.peek_pos();
        let value = match self.peek() {
            Some((Token::Ident("true" | "True" | "t"), _)) => true,
            Some((Token::Ident("false" | "False" | "f"), _)) => false,
            Some((Token::Number("1"), _)) => true,
            Some((Token::Number("0"), _)) => false,
            Some(_) => {
                return Err(ParseError::invalid_value(pos, &field.name, "expected true or false"));
            }
            None => return Err(self.unexpected("bool")),
        };
        self.advance();
        Ok(Value::Bool(value))
    }

    fn parse_integer_value(&mut self, field: &FieldSchema) -> ParseResult<Value> {
        let pos = self.peek_pos();
        let text = match self.peek() {
            Some((Token::Number(text), _)) => *text,
            _ => return Err(self.unexpected("integer")),
        };
        self.advance();

        let n = parse_integer(text)
            .ok_or_else(|| ParseError::invalid_value(pos, &field.name, format!("'{}' is not an integer", text)))?;

        let value = match field.ty {
            FieldType::Int32 => i32::try_from(n).ok().map(|v| Value::Int(v.into())),
            FieldType::Int64 => i64::try_from(n).ok().map(Value::Int),
            FieldType::UInt32 => u32::try_from(n).ok().map(|v| Value::UInt(v.into())),
            _ => u64::try_from(n).ok().map(Value::UInt),
        };

        value.ok_or_else(|| {
            ParseError::invalid_value(pos, &field.name, format!("{} out of range for {}", text, field.ty))
        })
    }

    fn parse_float_value(&mut self, field: &FieldSchema) -> ParseResult<Value> {
        let pos = self.peek_pos();
        let negative = self.match_token(Token::Minus);

        let value = match self.peek() {
            Some((Token::Ident(word), _)) => match word.to_ascii_lowercase().as_str() {
                "inf" | "infinity" => f64::INFINITY,
                "nan" => f64::NAN,
                _ => return Err(ParseError::invalid_value(pos, &field.name, "expected number")),
            },
            Some((Token::Number(text), _)) if !negative => {
                let text = text.trim_end_matches(|c: char| c == 'f' || c == 'F');
                let parsed = if field.ty == FieldType::Float {
                    text.parse::<f32>().ok().map(f64::from)
                } else {
                    text.parse::<f64>().ok()
                };
                parsed.ok_or_else(|| {
                    ParseError::invalid_value(pos, &field.name, format!("'{}' is not a number", text))
                })?
            }
            _ => return Err(self.unexpected("number")),
        };
        self.advance();

        Ok(Value::Float(if negative { -value } else { value }))
    }

    /// Adjacent string literals are concatenated
    fn parse_string(&mut self) -> ParseResult<String> {
        let start = self.peek_pos();
        let mut bytes = Vec::new();
        let mut any = false;

        while let Some((Token::String(literal), span)) = self.peek() {
            let (literal, span_start) = (*literal, span.start);
            unescape_into(literal, span_start, &mut bytes)?;
            self.advance();
            any = true;
        }

        if !any {
            return Err(self.unexpected("string"));
        }

        String::from_utf8(bytes).map_err(|_| ParseError::invalid_string(start, "string is not valid UTF-8"))
    }

    fn peek(&self) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn peek_pos(&self) -> usize {
        self.peek().map(|(_, span)| span.start).unwrap_or(self.source.len())
    }

    fn check(&self, token: Token) -> bool {
        self.peek().map(|(t, _)| same_kind(t, &token)).unwrap_or(false)
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> ParseResult<()> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(&'src str, usize)> {
        match self.peek() {
            Some((Token::Ident(name), span)) => {
                let result = (*name, span.start);
                self.advance();
                Ok(result)
            }
            _ => Err(self.unexpected("field name")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some((token, span)) => ParseError::unexpected_token(span.start, expected, token.to_string()),
            None => ParseError::unexpected_eof(self.source.len(), expected),
        }
    }
}

fn same_kind(a: &Token, b: &Token) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Decimal or hex integer with optional sign; floats and suffixes are rejected
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).ok()?
    } else if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse::<i128>().ok()?
    } else {
        return None;
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Decode a quoted literal (quotes included) into raw bytes
fn unescape_into(literal: &str, pos: usize, out: &mut Vec<u8>) -> ParseResult<()> {
    let inner = &literal.as_bytes()[1..literal.len() - 1];
    let mut i = 0;

    while i < inner.len() {
        let b = inner[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let escape_pos = pos + 1 + i;
        let Some(&code) = inner.get(i + 1) else {
            return Err(ParseError::invalid_string(escape_pos, "dangling backslash"));
        };
        i += 2;

        match code {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'\\' | b'\'' | b'"' | b'?' => out.push(code),
            b'x' | b'X' => {
                let digits = inner[i..]
                    .iter()
                    .take(2)
                    .take_while(|c| c.is_ascii_hexdigit())
                    .count();
                if digits == 0 {
                    return Err(ParseError::invalid_string(escape_pos, "\\x used with no following hex digits"));
                }
                let text = std::str::from_utf8(&inner[i..i + digits]).unwrap_or("0");
                out.push(u8::from_str_radix(text, 16).unwrap_or(0));
                i += digits;
            }
            b'0'..=b'7' => {
                let mut value: u32 = u32::from(code - b'0');
                let mut taken = 0;
                while taken < 2 {
                    match inner.get(i) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                            taken += 1;
                        }
                        _ => break,
                    }
                }
                let byte = u8::try_from(value)
                    .map_err(|_| ParseError::invalid_string(escape_pos, "octal escape out of range"))?;
                out.push(byte);
            }
            other => {
                return Err(ParseError::invalid_string(
                    escape_pos,
                    format!("invalid escape sequence '\\{}'", other as char),
                ));
            }
        }
    }

    Ok(())
}

/// Parse text into a message of `schema`
///
/// Required fields are not checked; see [`parse_strict`].
pub fn parse(source: &str, schema: &Arc<MessageSchema>) -> ParseResult<Message> {
    Parser::new(source)?.parse_message(schema)
}

/// Parse text and reject messages with unset required fields anywhere in the tree
pub fn parse_strict(source: &str, schema: &Arc<MessageSchema>) -> ParseResult<Message> {
    let message = parse(source, schema)?;
    match message.missing_required().into_iter().next() {
        Some(path) => Err(ParseError::MissingRequired { path }),
        None => Ok(message),
    }
}

/// Parse one value for `field`: a scalar literal, or a message body with or without braces
pub fn parse_value(source: &str, field: &FieldSchema) -> ParseResult<Value> {
    Parser::new(source)?.parse_field_value(field)
}
