//! Method registry: name → metadata + argument converter + typed handler.
//!
//! Methods are registered explicitly at startup. Each registration pairs a
//! conversion function from raw string arguments to a typed value with a
//! handler taking that value, so argument validation at submit time and
//! invocation at batch time share one conversion.

use crate::{ContractContext, ContractError};
use chainbatch_types::Address;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// How a method is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Submitted to the pending-call store and executed in a batch.
    Tx,
    /// Executed immediately, writes committed directly.
    NoBatchTx,
    /// Executed immediately against a read-only view.
    Query,
}

/// Static description of a registered method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub kind: MethodKind,
    /// Whether a sender identity is required.
    pub needs_auth: bool,
    /// Number of raw arguments the converter consumes.
    pub arity: usize,
}

impl MethodInfo {
    pub fn tx(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Tx,
            needs_auth: true,
            arity,
        }
    }

    pub fn no_batch(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::NoBatchTx,
            needs_auth: false,
            arity,
        }
    }

    pub fn query(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Query,
            needs_auth: false,
            arity,
        }
    }

    pub fn with_auth(mut self, needs_auth: bool) -> Self {
        self.needs_auth = needs_auth;
        self
    }
}

/// Errors building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("method '{0}' is registered twice")]
    Duplicate(String),
}

type Validator = Arc<dyn Fn(&[String]) -> Result<(), ContractError> + Send + Sync>;
type Handler = Arc<
    dyn Fn(&mut ContractContext<'_>, Option<&Address>, &[String]) -> Result<Option<String>, ContractError>
        + Send
        + Sync,
>;

struct Method {
    info: MethodInfo,
    validate: Validator,
    call: Handler,
}

/// Name → method table.
///
/// Iteration order is registration order.
#[derive(Default)]
pub struct MethodRegistry {
    methods: IndexMap<String, Method>,
    disabled: HashSet<String>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method.
    ///
    /// `convert` turns the raw arguments (already trimmed to `info.arity`)
    /// into the handler's argument value. It is run at submit time to
    /// validate and again at execution time to invoke.
    pub fn register<A, C, F>(
        &mut self,
        info: MethodInfo,
        convert: C,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        A: 'static,
        C: Fn(&[String]) -> Result<A, ContractError> + Send + Sync + 'static,
        F: Fn(&mut ContractContext<'_>, Option<&Address>, A) -> Result<Option<String>, ContractError>
            + Send
            + Sync
            + 'static,
    {
        if self.methods.contains_key(&info.name) {
            return Err(RegistryError::Duplicate(info.name));
        }

        let convert = Arc::new(convert);
        let for_validate = Arc::clone(&convert);
        let validate: Validator =
            Arc::new(move |raw: &[String]| (*for_validate)(raw).map(|_| ()));
        let call: Handler = Arc::new(
            move |ctx: &mut ContractContext<'_>, sender: Option<&Address>, raw: &[String]| {
                let args = (*convert)(raw)?;
                handler(ctx, sender, args)
            },
        );

        self.methods.insert(
            info.name.clone(),
            Method {
                info,
                validate,
                call,
            },
        );
        Ok(())
    }

    /// Refuse to resolve `name` from now on.
    pub fn disable(&mut self, name: impl Into<String>) {
        self.disabled.insert(name.into());
    }

    /// Look up a method. Disabled methods do not resolve.
    pub fn resolve(&self, name: &str) -> Option<&MethodInfo> {
        if self.disabled.contains(name) {
            return None;
        }
        self.methods.get(name).map(|m| &m.info)
    }

    /// Check arity, run the converter, and return the arguments to persist.
    ///
    /// Extra arguments beyond the arity are dropped.
    pub fn convert_arguments(&self, name: &str, raw: &[String]) -> Result<Vec<String>, ContractError> {
        let method = self.method(name)?;
        let args = Self::trim(&method.info, raw)?;
        (method.validate)(args)?;
        Ok(args.to_vec())
    }

    /// Convert `raw` and invoke the handler.
    pub fn call(
        &self,
        name: &str,
        ctx: &mut ContractContext<'_>,
        sender: Option<&Address>,
        raw: &[String],
    ) -> Result<Option<String>, ContractError> {
        let method = self.method(name)?;
        let args = Self::trim(&method.info, raw)?;
        (method.call)(ctx, sender, args)
    }

    /// Registered method names in registration order, disabled ones included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn method(&self, name: &str) -> Result<&Method, ContractError> {
        if self.disabled.contains(name) {
            return Err(ContractError::NotFound(format!("method '{name}' not found")));
        }
        self.methods
            .get(name)
            .ok_or_else(|| ContractError::NotFound(format!("method '{name}' not found")))
    }

    fn trim<'a>(info: &MethodInfo, raw: &'a [String]) -> Result<&'a [String], ContractError> {
        if raw.len() < info.arity {
            return Err(ContractError::invalid_argument(format!(
                "incorrect number of arguments, found {} but expected {}",
                raw.len(),
                info.arity
            )));
        }
        Ok(&raw[..info.arity])
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// Parse argument `index` as `T`.
pub fn parse_arg<T>(raw: &[String], index: usize, name: &str) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = raw.get(index).ok_or_else(|| {
        ContractError::invalid_argument(format!("missing argument {index} ({name})"))
    })?;
    value
        .parse()
        .map_err(|e| ContractError::invalid_argument(format!("invalid argument {name}: {e}")))
}

/// The sender of an authenticated method.
pub fn require_sender(sender: Option<&Address>) -> Result<&Address, ContractError> {
    sender.ok_or_else(|| ContractError::unauthorized("sender is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContractConfig, ErrorKind, LedgerState, MemoryLedger};
    use chainbatch_types::Amount;

    fn registry() -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        registry
            .register(
                MethodInfo::tx("store", 2),
                |raw| Ok((parse_arg::<String>(raw, 0, "key")?, parse_arg::<Amount>(raw, 1, "amount")?)),
                |ctx, _sender, (key, amount): (String, Amount)| {
                    ctx.state().put_state(&key, amount.to_string().into_bytes())?;
                    Ok(None)
                },
            )
            .unwrap();
        registry
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_and_disable() {
        let mut registry = registry();
        let info = registry.resolve("store").unwrap();
        assert_eq!(info.arity, 2);
        assert!(info.needs_auth);
        assert!(registry.resolve("missing").is_none());

        registry.disable("store");
        assert!(registry.resolve("store").is_none());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let err = registry
            .register(MethodInfo::query("store", 0), |_| Ok(()), |_, _, _| Ok(None))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("store".into()));
    }

    #[test]
    fn test_convert_arguments() {
        let registry = registry();
        assert_eq!(
            registry
                .convert_arguments("store", &args(&["k", "10", "extra"]))
                .unwrap(),
            args(&["k", "10"])
        );

        let err = registry.convert_arguments("store", &args(&["k"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = registry
            .convert_arguments("store", &args(&["k", "ten"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = registry.convert_arguments("nope", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_call_invokes_handler() {
        let registry = registry();
        let config = ContractConfig::for_channel("CC");
        let mut ledger = MemoryLedger::new();
        {
            let mut ctx = ContractContext::new(&mut ledger, &config);
            registry
                .call("store", &mut ctx, None, &args(&["k", "42"]))
                .unwrap();
        }
        assert_eq!(ledger.get_state("k").unwrap(), Some(b"42".to_vec()));
    }

    #[test]
    fn test_require_sender() {
        assert_eq!(
            require_sender(None).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        let addr = Address([1; 32]);
        assert_eq!(require_sender(Some(&addr)).unwrap(), &addr);
    }
}
