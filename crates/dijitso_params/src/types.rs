//! Parameter types and their built-in defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

/// What happens to a cached source file after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SrcStorage {
    /// Leave the source file as is.
    Keep,
    /// Remove the source file.
    Delete,
    /// Gzip the source file and remove the original.
    Compress,
}

impl FromStr for SrcStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Self::Keep),
            "delete" => Ok(Self::Delete),
            "compress" => Ok(Self::Compress),
            other => Err(format!(
                "expected 'keep', 'delete', or 'compress', got '{other}'"
            )),
        }
    }
}

/// Cache location and artifact naming parameters.
///
/// All artifact paths are `<cache_dir>/<category dir>/<prefix><signature><postfix>`.
/// The defaults are normative for interoperability with existing caches.
#[derive(Debug, Clone, Serialize)]
pub struct CacheParams {
    /// Root directory of the cache tree.
    pub cache_dir: PathBuf,
    /// Subdirectory for header files.
    pub inc_dir: String,
    /// Subdirectory for source files.
    pub src_dir: String,
    /// Subdirectory for shared libraries.
    pub lib_dir: String,
    /// Subdirectory for build logs.
    pub log_dir: String,
    /// Subdirectory for multi-process coordination scratch files.
    pub comm_dir: String,
    /// Filename suffix for headers.
    pub inc_postfix: String,
    /// Filename suffix for sources.
    pub src_postfix: String,
    /// Filename suffix for logs.
    pub log_postfix: String,
    /// Filename suffix for shared libraries.
    pub lib_postfix: String,
    /// Filename prefix for shared libraries.
    pub lib_prefix: String,
    /// Source retention policy applied after a successful build.
    pub src_storage: SrcStorage,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            inc_dir: "inc".to_string(),
            src_dir: "src".to_string(),
            lib_dir: "lib".to_string(),
            log_dir: "log".to_string(),
            comm_dir: "comm".to_string(),
            inc_postfix: ".h".to_string(),
            src_postfix: ".cpp".to_string(),
            log_postfix: ".txt".to_string(),
            lib_postfix: ".so".to_string(),
            lib_prefix: "libdijitso-".to_string(),
            src_storage: SrcStorage::Keep,
        }
    }
}

/// Default cache root: `~/.cache/dijitso`, or a relative fallback when the
/// home directory cannot be determined.
fn default_cache_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".cache").join("dijitso"),
        None => PathBuf::from(".dijitso-cache"),
    }
}

/// Compiler invocation parameters.
#[derive(Debug, Clone, Serialize)]
pub struct BuildParams {
    /// Compiler program name.
    pub cxx: String,
    /// Flags always passed to the compiler.
    pub cxxflags: Vec<String>,
    /// Flags appended when `debug` is set.
    pub cxxflags_debug: Vec<String>,
    /// Flags appended when `debug` is not set.
    pub cxxflags_opt: Vec<String>,
    /// Extra include directories.
    pub include_dirs: Vec<PathBuf>,
    /// Extra library directories.
    pub lib_dirs: Vec<PathBuf>,
    /// Extra rpath directories embedded into the produced library.
    pub rpath_dirs: Vec<PathBuf>,
    /// Names of libraries to link against.
    pub libs: Vec<String>,
    /// Whether to compile with debug flags.
    pub debug: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            cxx: "g++".to_string(),
            cxxflags: to_strings(&["-shared", "-fPIC", "-fvisibility=hidden", "-std=c++11"]),
            cxxflags_debug: to_strings(&["-g", "-O0"]),
            // The fastmath subset below keeps nan/inf/underflow handling
            // acceptable for generated numerical kernels.
            cxxflags_opt: to_strings(&[
                "-O3",
                "-fno-math-errno",
                "-fno-trapping-math",
                "-ffinite-math-only",
            ]),
            include_dirs: Vec::new(),
            lib_dirs: Vec::new(),
            rpath_dirs: Vec::new(),
            libs: Vec::new(),
            debug: false,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Opaque parameters passed through to the caller's generator. The core
/// only hashes them into the module signature.
pub type GeneratorParams = BTreeMap<String, String>;

/// The fully resolved parameter set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Params {
    /// Cache location and naming.
    pub cache: CacheParams,
    /// Compiler configuration.
    pub build: BuildParams,
    /// Opaque generator configuration.
    pub generator: GeneratorParams,
}

impl Params {
    /// Flattens the signature-relevant parameters (generator and build,
    /// never cache) into key/value pairs for module-signature derivation.
    pub fn signature_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .generator
            .iter()
            .map(|(k, v)| (format!("generator.{k}"), v.clone()))
            .collect();

        let b = &self.build;
        pairs.push(("build.cxx".to_string(), b.cxx.clone()));
        pairs.push(("build.cxxflags".to_string(), format!("{:?}", b.cxxflags)));
        pairs.push((
            "build.cxxflags_debug".to_string(),
            format!("{:?}", b.cxxflags_debug),
        ));
        pairs.push((
            "build.cxxflags_opt".to_string(),
            format!("{:?}", b.cxxflags_opt),
        ));
        pairs.push((
            "build.include_dirs".to_string(),
            format!("{:?}", b.include_dirs),
        ));
        pairs.push(("build.lib_dirs".to_string(), format!("{:?}", b.lib_dirs)));
        pairs.push((
            "build.rpath_dirs".to_string(),
            format!("{:?}", b.rpath_dirs),
        ));
        pairs.push(("build.libs".to_string(), format!("{:?}", b.libs)));
        pairs.push(("build.debug".to_string(), b.debug.to_string()));
        pairs
    }
}

/// A single override value before coercion: either a scalar string or a
/// list of strings. Config files only produce scalars; callers may pass
/// either form for list-typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A scalar value, coerced to the target type of the key.
    Str(String),
    /// A list value, accepted only by list-typed keys.
    List(Vec<String>),
}

impl ParamValue {
    /// Renders the value as a single string, used for free-form generator
    /// entries.
    pub fn as_repr(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::List(items) => format!("{items:?}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(items: &[&str]) -> Self {
        Self::List(items.iter().map(|s| s.to_string()).collect())
    }
}

/// Caller-supplied overrides: category name to key/value entries.
pub type ParamsOverrides = BTreeMap<String, BTreeMap<String, ParamValue>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_defaults_are_normative() {
        let p = CacheParams::default();
        assert_eq!(p.inc_dir, "inc");
        assert_eq!(p.src_dir, "src");
        assert_eq!(p.lib_dir, "lib");
        assert_eq!(p.log_dir, "log");
        assert_eq!(p.comm_dir, "comm");
        assert_eq!(p.src_postfix, ".cpp");
        assert_eq!(p.lib_prefix, "libdijitso-");
        assert_eq!(p.lib_postfix, ".so");
        assert_eq!(p.src_storage, SrcStorage::Keep);
    }

    #[test]
    fn build_defaults() {
        let p = BuildParams::default();
        assert_eq!(p.cxx, "g++");
        assert!(p.cxxflags.contains(&"-shared".to_string()));
        assert!(p.cxxflags.contains(&"-fPIC".to_string()));
        assert_eq!(p.cxxflags_debug, vec!["-g", "-O0"]);
        assert!(!p.debug);
        assert!(p.libs.is_empty());
    }

    #[test]
    fn src_storage_parses() {
        assert_eq!("keep".parse::<SrcStorage>().unwrap(), SrcStorage::Keep);
        assert_eq!("delete".parse::<SrcStorage>().unwrap(), SrcStorage::Delete);
        assert_eq!(
            "compress".parse::<SrcStorage>().unwrap(),
            SrcStorage::Compress
        );
        assert!("archive".parse::<SrcStorage>().is_err());
    }

    #[test]
    fn signature_pairs_cover_build_and_generator() {
        let mut params = Params::default();
        params
            .generator
            .insert("scalar_type".to_string(), "double".to_string());
        let pairs = params.signature_pairs();
        assert!(pairs.iter().any(|(k, _)| k == "generator.scalar_type"));
        assert!(pairs.iter().any(|(k, v)| k == "build.cxx" && v == "g++"));
        assert!(pairs.iter().any(|(k, v)| k == "build.debug" && v == "false"));
        // Cache parameters must not influence the module signature.
        assert!(!pairs.iter().any(|(k, _)| k.starts_with("cache.")));
    }

    #[test]
    fn signature_pairs_distinguish_debug() {
        let mut a = Params::default();
        let mut b = Params::default();
        a.build.debug = false;
        b.build.debug = true;
        assert_ne!(a.signature_pairs(), b.signature_pairs());
    }

    #[test]
    fn param_value_reprs() {
        assert_eq!(ParamValue::from("x").as_repr(), "x");
        let list = ParamValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(list.as_repr(), r#"["a", "b"]"#);
    }
}
