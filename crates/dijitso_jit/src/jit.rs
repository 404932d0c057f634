//! The jit entry point and its explicit per-process context.

use std::sync::Arc;

use dijitso_build::build_shared_library;
use dijitso_cache::{
    compress_source_code, lib_filename, read_library_binary, src_filename, store_inc, store_src,
    write_library_binary, LibraryCache, LoadedLibrary,
};
use dijitso_common::extend_signature;
use dijitso_params::{validate_params, GeneratorParams, ParamsOverrides};

use crate::error::{CallbackError, JitError};

type GenerateCallback<'a, J> =
    Box<dyn FnOnce(&str, &str, &J, &GeneratorParams) -> Result<(String, String), CallbackError> + 'a>;
type SendCallback<'a> = Box<dyn FnOnce(&[u8]) -> Result<(), CallbackError> + 'a>;
type ReceiveCallback<'a> = Box<dyn FnOnce() -> Result<Vec<u8>, CallbackError> + 'a>;
type WaitCallback<'a> = Box<dyn FnOnce() -> Result<(), CallbackError> + 'a>;

/// One JIT request: the jitable, its base signature, parameter overrides,
/// and the callbacks implied by this peer's role.
///
/// A peer given `generate` is a builder; a peer given `receive` is a
/// receiver; a peer given only `wait` is a waiter. Builders may also be
/// given `send` to ship the compiled binary, and any peer may be given
/// `wait` as the post-build barrier.
pub struct JitRequest<'a, J> {
    base_signature: &'a str,
    jitable: &'a J,
    overrides: ParamsOverrides,
    dependencies: Vec<String>,
    generate: Option<GenerateCallback<'a, J>>,
    send: Option<SendCallback<'a>>,
    receive: Option<ReceiveCallback<'a>>,
    wait: Option<WaitCallback<'a>>,
}

impl<'a, J> JitRequest<'a, J> {
    /// Starts a request for a jitable identified by `base_signature`.
    pub fn new(base_signature: &'a str, jitable: &'a J) -> Self {
        Self {
            base_signature,
            jitable,
            overrides: ParamsOverrides::new(),
            dependencies: Vec::new(),
            generate: None,
            send: None,
            receive: None,
            wait: None,
        }
    }

    /// Sets parameter overrides layered over defaults and the config file.
    pub fn with_overrides(mut self, overrides: ParamsOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Declares module signatures of previously built libraries this
    /// jitable links against.
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Supplies the code generator, making this peer a builder. The
    /// generator receives the base signature, the derived module signature,
    /// the jitable, and the generator parameters, and returns a header
    /// (possibly empty) and a complete translation unit.
    pub fn generate(
        mut self,
        f: impl FnOnce(&str, &str, &J, &GeneratorParams) -> Result<(String, String), CallbackError> + 'a,
    ) -> Self {
        self.generate = Some(Box::new(f));
        self
    }

    /// Supplies the transport used to ship the compiled binary to peers.
    pub fn send(mut self, f: impl FnOnce(&[u8]) -> Result<(), CallbackError> + 'a) -> Self {
        self.send = Some(Box::new(f));
        self
    }

    /// Supplies the transport for obtaining the compiled binary from the
    /// builder, making this peer a receiver.
    pub fn receive(mut self, f: impl FnOnce() -> Result<Vec<u8>, CallbackError> + 'a) -> Self {
        self.receive = Some(Box::new(f));
        self
    }

    /// Supplies the barrier all peers cross before loading the library.
    pub fn wait(mut self, f: impl FnOnce() -> Result<(), CallbackError> + 'a) -> Self {
        self.wait = Some(Box::new(f));
        self
    }
}

/// Per-process JIT state: the in-memory library handle map and the
/// once-per-process directory bookkeeping.
///
/// Thread a single context through all `jit` calls of a process so repeated
/// requests for the same signature return the same handle. Concurrent calls
/// on the same context require external synchronization; distinct contexts
/// over distinct signatures are independent.
#[derive(Debug, Default)]
pub struct JitContext {
    libs: LibraryCache,
}

impl JitContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the module signature a request would be cached under.
    ///
    /// Useful for declaring one jitable as a dependency of another: the
    /// dependent request passes this value in its dependency list.
    pub fn module_signature(
        &self,
        base_signature: &str,
        overrides: &ParamsOverrides,
    ) -> Result<String, JitError> {
        let params = validate_params(overrides)?;
        Ok(extend_signature(base_signature, &params.signature_pairs()))
    }

    /// Drives just-in-time compilation of a jitable, returning a loaded
    /// library handle.
    ///
    /// The pipeline: validate parameters, derive the module signature,
    /// probe the memory and disk caches, and on a miss perform this peer's
    /// role (generate + build + optional send, or receive, or nothing),
    /// cross the optional `wait` barrier, and load the library from disk.
    pub fn jit<J>(
        &mut self,
        request: JitRequest<'_, J>,
    ) -> Result<Arc<LoadedLibrary>, JitError> {
        let params = validate_params(&request.overrides)?;
        let module_signature = extend_signature(request.base_signature, &params.signature_pairs());

        if let Some(lib) = self.libs.lookup_lib(&module_signature, &params.cache)? {
            log::debug!("cache hit for {module_signature}");
            return Ok(lib);
        }

        if request.generate.is_some() && request.receive.is_some() {
            return Err(JitError::ConflictingRoles);
        }

        if let Some(generate) = request.generate {
            let (header, source) = generate(
                request.base_signature,
                &module_signature,
                request.jitable,
                &params.generator,
            )
            .map_err(JitError::Generate)?;

            self.libs.ensure_dirs(&params.cache)?;
            store_src(&module_signature, &source, &params.cache)?;
            if !header.is_empty() {
                store_inc(&module_signature, &header, &params.cache)?;
            }

            let outcome = build_shared_library(
                &module_signature,
                (!header.is_empty()).then_some(header.as_str()),
                &source,
                &request.dependencies,
                &params,
            )?;
            if !outcome.success() {
                return Err(JitError::Compile {
                    signature: module_signature,
                    status: outcome.status,
                    output: outcome.output,
                });
            }

            compress_source_code(&src_filename(&module_signature, &params.cache), &params.cache)?;

            if let Some(send) = request.send {
                let data =
                    read_library_binary(&lib_filename(&module_signature, &params.cache))?;
                send(&data).map_err(JitError::Send)?;
            }
        } else if let Some(receive) = request.receive {
            let data = receive().map_err(JitError::Receive)?;
            write_library_binary(&data, &module_signature, &params.cache)?;
        } else if request.wait.is_none() {
            return Err(JitError::MissingRole);
        }

        if let Some(wait) = request.wait {
            wait().map_err(JitError::Wait)?;
        }

        match self.libs.load_library(&module_signature, &params.cache)? {
            Some(lib) => Ok(lib),
            None => Err(JitError::NotBuilt {
                signature: module_signature,
            }),
        }
    }
}
