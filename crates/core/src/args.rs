//! Typed argument structures and their parsers.
//!
//! Every command has one parser: a pure function from the raw term list to
//! an [`Arguments`] value. Parsers check arity, element shapes and value
//! ranges; anything they accept is safe to hand to a backend handler.
//! Parsers never touch the backend and never panic on malformed input.

use serde::{Deserialize, Serialize};

use crate::command::CommandId;
use crate::error::{Error, Result};
use crate::term::Term;

// =============================================================================
// Argument types
// =============================================================================

/// Arguments for [`CommandId::Connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectArgs {
    /// `host[:port]` list understood by the backend
    pub host: String,
    /// Bucket user
    pub username: String,
    /// Bucket password
    pub password: String,
    /// Bucket name
    pub bucket: String,
}

/// Store mode. Discriminants are the wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOp {
    /// Fail if the key exists
    Add = 1,
    /// Fail if the key is missing
    Replace = 2,
    /// Unconditional write
    Set = 3,
    /// Append to an existing value
    Append = 4,
    /// Prepend to an existing value
    Prepend = 5,
}

impl StoreOp {
    fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            1 => Some(StoreOp::Add),
            2 => Some(StoreOp::Replace),
            3 => Some(StoreOp::Set),
            4 => Some(StoreOp::Append),
            5 => Some(StoreOp::Prepend),
            _ => None,
        }
    }
}

/// Arguments for [`CommandId::Store`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreArgs {
    /// Store mode
    pub op: StoreOp,
    /// Item key
    pub key: Vec<u8>,
    /// Item value
    pub value: Vec<u8>,
    /// Opaque client flags stored alongside the value
    pub flags: u32,
    /// Expiry; 0 means never
    pub exp: u32,
    /// Expected CAS; 0 means don't check
    pub cas: u64,
}

/// Arguments for [`CommandId::MultiGet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiGetArgs {
    /// Keys to fetch; never empty
    pub keys: Vec<Vec<u8>>,
    /// New expiry applied on read (get-and-touch); 0 leaves expiry alone
    pub exp: u32,
    /// Take a lock on every fetched item
    pub lock: bool,
}

/// Arguments for [`CommandId::Unlock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockArgs {
    /// Locked key
    pub key: Vec<u8>,
    /// CAS returned by the locking get
    pub cas: u64,
}

/// Arguments for [`CommandId::Touch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchArgs {
    /// `(key, expiry)` pairs; never empty
    pub entries: Vec<(Vec<u8>, u32)>,
}

/// Arguments for [`CommandId::Arithmetic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticArgs {
    /// Counter key
    pub key: Vec<u8>,
    /// Signed delta
    pub delta: i64,
    /// Expiry; 0 means never
    pub exp: u32,
    /// Create the counter with `initial` when missing
    pub create: bool,
    /// Initial value used when creating
    pub initial: u64,
}

/// Arguments for [`CommandId::Remove`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveArgs {
    /// Key to delete
    pub key: Vec<u8>,
    /// Expected CAS; 0 means don't check
    pub cas: u64,
}

/// HTTP verb. Discriminants are the wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[allow(missing_docs)]
    Get = 0,
    #[allow(missing_docs)]
    Post = 1,
    #[allow(missing_docs)]
    Put = 2,
    #[allow(missing_docs)]
    Delete = 3,
}

/// Which REST surface an HTTP request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpType {
    /// View queries
    View = 0,
    /// Cluster management API
    Management = 1,
    /// Passed through untouched
    Raw = 2,
}

/// Arguments for [`CommandId::Http`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpArgs {
    /// Request path
    pub path: String,
    /// Request body
    pub body: Vec<u8>,
    /// Content type header
    pub content_type: String,
    /// HTTP verb
    pub method: HttpMethod,
    /// Target surface
    pub kind: HttpType,
}

/// A parsed argument object, tagged by command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arguments {
    #[allow(missing_docs)]
    Connect(ConnectArgs),
    #[allow(missing_docs)]
    Store(StoreArgs),
    #[allow(missing_docs)]
    MultiGet(MultiGetArgs),
    #[allow(missing_docs)]
    Unlock(UnlockArgs),
    #[allow(missing_docs)]
    Touch(TouchArgs),
    #[allow(missing_docs)]
    Arithmetic(ArithmeticArgs),
    #[allow(missing_docs)]
    Remove(RemoveArgs),
    #[allow(missing_docs)]
    Http(HttpArgs),
}

impl Arguments {
    /// The command these arguments belong to.
    pub fn command(&self) -> CommandId {
        match self {
            Arguments::Connect(_) => CommandId::Connect,
            Arguments::Store(_) => CommandId::Store,
            Arguments::MultiGet(_) => CommandId::MultiGet,
            Arguments::Unlock(_) => CommandId::Unlock,
            Arguments::Touch(_) => CommandId::Touch,
            Arguments::Arithmetic(_) => CommandId::Arithmetic,
            Arguments::Remove(_) => CommandId::Remove,
            Arguments::Http(_) => CommandId::Http,
        }
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// Parse `[Host, Username, Password, Bucket]`.
pub fn parse_connect(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Connect, terms, 4)?;
    Ok(Arguments::Connect(ConnectArgs {
        host: r.string("host")?,
        username: r.string("username")?,
        password: r.string("password")?,
        bucket: r.string("bucket")?,
    }))
}

/// Parse `[Op, Key, Value, Flags, Exp, Cas]`.
pub fn parse_store(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Store, terms, 6)?;
    let raw_op = r.int("op")?;
    let op = StoreOp::from_raw(raw_op)
        .ok_or_else(|| r.fail(format!("argument 1 (op): unknown store op {}", raw_op)))?;
    Ok(Arguments::Store(StoreArgs {
        op,
        key: r.key("key")?,
        value: r.binary("value")?,
        flags: r.u32("flags")?,
        exp: r.u32("exp")?,
        cas: r.u64("cas")?,
    }))
}

/// Parse `[Keys, Exp, Lock]`.
pub fn parse_mget(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::MultiGet, terms, 3)?;
    let keys = r.key_list("keys")?;
    Ok(Arguments::MultiGet(MultiGetArgs {
        keys,
        exp: r.u32("exp")?,
        lock: r.flag("lock")?,
    }))
}

/// Parse `[Key, Cas]`.
pub fn parse_unlock(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Unlock, terms, 2)?;
    Ok(Arguments::Unlock(UnlockArgs {
        key: r.key("key")?,
        cas: r.u64("cas")?,
    }))
}

/// Parse `[Keys, Exps]`; both lists must have the same length.
pub fn parse_mtouch(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Touch, terms, 2)?;
    let keys = r.key_list("keys")?;
    let exps = r.list("exps")?;
    if exps.len() != keys.len() {
        return Err(r.fail(format!(
            "argument 2 (exps): expected {} expiries, got {}",
            keys.len(),
            exps.len()
        )));
    }
    let mut entries = Vec::with_capacity(keys.len());
    for (i, (key, exp)) in keys.into_iter().zip(exps).enumerate() {
        let exp = exp
            .as_int()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                r.fail(format!("argument 2 (exps): element {} is not a valid expiry", i + 1))
            })?;
        entries.push((key, exp));
    }
    Ok(Arguments::Touch(TouchArgs { entries }))
}

/// Parse `[Key, Delta, Exp, Create, Initial]`.
pub fn parse_arithmetic(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Arithmetic, terms, 5)?;
    Ok(Arguments::Arithmetic(ArithmeticArgs {
        key: r.key("key")?,
        delta: r.int("delta")?,
        exp: r.u32("exp")?,
        create: r.flag("create")?,
        initial: r.u64("initial")?,
    }))
}

/// Parse `[Key, Cas]`.
pub fn parse_remove(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Remove, terms, 2)?;
    Ok(Arguments::Remove(RemoveArgs {
        key: r.key("key")?,
        cas: r.u64("cas")?,
    }))
}

/// Parse `[Path, Body, ContentType, Method, Type]`.
pub fn parse_http(terms: &[Term]) -> Result<Arguments> {
    let mut r = ArgReader::new(CommandId::Http, terms, 5)?;
    let path = r.string("path")?;
    let body = r.binary("body")?;
    let content_type = r.string("content_type")?;
    let method = match r.int("method")? {
        0 => HttpMethod::Get,
        1 => HttpMethod::Post,
        2 => HttpMethod::Put,
        3 => HttpMethod::Delete,
        other => return Err(r.fail(format!("argument 4 (method): unknown method {}", other))),
    };
    let kind = match r.int("type")? {
        0 => HttpType::View,
        1 => HttpType::Management,
        2 => HttpType::Raw,
        other => return Err(r.fail(format!("argument 5 (type): unknown request type {}", other))),
    };
    Ok(Arguments::Http(HttpArgs {
        path,
        body,
        content_type,
        method,
        kind,
    }))
}

/// Sequential reader over a raw argument list with a fixed arity.
struct ArgReader<'a> {
    command: CommandId,
    terms: &'a [Term],
    pos: usize,
}

impl<'a> ArgReader<'a> {
    fn new(command: CommandId, terms: &'a [Term], arity: usize) -> Result<Self> {
        if terms.len() != arity {
            return Err(Error::parse(
                command,
                format!("expected {} arguments, got {}", arity, terms.len()),
            ));
        }
        Ok(Self {
            command,
            terms,
            pos: 0,
        })
    }

    fn fail(&self, reason: String) -> Error {
        Error::parse(self.command, reason)
    }

    fn mismatch(&self, field: &str, expected: &str, got: &Term) -> Error {
        self.fail(format!(
            "argument {} ({}): expected {}, got {}",
            self.pos,
            field,
            expected,
            got.type_name()
        ))
    }

    fn next(&mut self, field: &str) -> Result<&'a Term> {
        let term = self
            .terms
            .get(self.pos)
            .ok_or_else(|| self.fail(format!("missing argument {} ({})", self.pos + 1, field)))?;
        self.pos += 1;
        Ok(term)
    }

    fn binary(&mut self, field: &str) -> Result<Vec<u8>> {
        let term = self.next(field)?;
        term.as_binary()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| self.mismatch(field, "binary", term))
    }

    fn key(&mut self, field: &str) -> Result<Vec<u8>> {
        let key = self.binary(field)?;
        if key.is_empty() {
            return Err(self.fail(format!("argument {} ({}): key is empty", self.pos, field)));
        }
        Ok(key)
    }

    fn string(&mut self, field: &str) -> Result<String> {
        let bytes = self.binary(field)?;
        String::from_utf8(bytes)
            .map_err(|_| self.fail(format!("argument {} ({}): not valid UTF-8", self.pos, field)))
    }

    fn int(&mut self, field: &str) -> Result<i64> {
        let term = self.next(field)?;
        term.as_int()
            .ok_or_else(|| self.mismatch(field, "integer", term))
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        let v = self.int(field)?;
        u32::try_from(v).map_err(|_| {
            self.fail(format!("argument {} ({}): {} out of range", self.pos, field, v))
        })
    }

    // Unsigned 64-bit values arrive with their bit pattern in an Int, the
    // same way `Term::from(u64)` sends them out.
    fn u64(&mut self, field: &str) -> Result<u64> {
        Ok(self.int(field)? as u64)
    }

    fn flag(&mut self, field: &str) -> Result<bool> {
        match self.int(field)? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(self.fail(format!(
                "argument {} ({}): expected 0 or 1, got {}",
                self.pos, field, v
            ))),
        }
    }

    fn list(&mut self, field: &str) -> Result<&'a [Term]> {
        let term = self.next(field)?;
        term.as_list()
            .ok_or_else(|| self.mismatch(field, "list", term))
    }

    fn key_list(&mut self, field: &str) -> Result<Vec<Vec<u8>>> {
        let items = self.list(field)?;
        if items.is_empty() {
            return Err(self.fail(format!("argument {} ({}): list is empty", self.pos, field)));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item.as_binary() {
                Some(k) if !k.is_empty() => Ok(k.to_vec()),
                _ => Err(self.fail(format!(
                    "argument {} ({}): element {} is not a non-empty binary",
                    self.pos,
                    field,
                    i + 1
                ))),
            })
            .collect()
    }
}
