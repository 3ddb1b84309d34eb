//! A read-only view over parsed compiler options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tsl_source::path::{JS_EXTENSIONS, TS_EXTENSIONS};

/// Compiler options as produced by [`Compiler::parse_config`](crate::Compiler::parse_config).
///
/// Options are kept as the compiler's own key/value map. The accessors below
/// cover the options the engine itself acts on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerOptions {
    values: Map<String, Value>,
}

impl CompilerOptions {
    /// Wraps an option map.
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Returns the raw value of an option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Sets an option, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    fn flag(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// `declaration`: emit `.d.ts` files.
    pub fn declaration(&self) -> bool {
        self.flag("declaration")
    }

    /// `sourceMap`: emit `.map` files.
    pub fn source_map(&self) -> bool {
        self.flag("sourceMap")
    }

    /// `allowJs`: JavaScript files are part of the program.
    pub fn allow_js(&self) -> bool {
        self.flag("allowJs")
    }

    /// `isolatedModules`: every file must be transpilable on its own.
    pub fn isolated_modules(&self) -> bool {
        self.flag("isolatedModules")
    }

    /// `noEmit`: type-check only.
    pub fn no_emit(&self) -> bool {
        self.flag("noEmit")
    }

    /// `outDir`, if set.
    pub fn out_dir(&self) -> Option<&str> {
        self.string("outDir")
    }

    /// `declarationDir`, falling back to `outDir`.
    pub fn declaration_dir(&self) -> Option<&str> {
        self.string("declarationDir").or_else(|| self.out_dir())
    }

    /// Extensions of files the compiler treats as scripts.
    pub fn script_extensions(&self) -> Vec<&'static str> {
        let mut extensions = TS_EXTENSIONS.to_vec();
        if self.allow_js() {
            extensions.extend(JS_EXTENSIONS);
        }
        extensions
    }
}

impl From<Map<String, Value>> for CompilerOptions {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
