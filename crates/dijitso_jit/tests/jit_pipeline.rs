//! End-to-end pipeline tests against a real C++ compiler.
//!
//! Every test that invokes the compiler probes for `g++` first and returns
//! early when it is unavailable, so the suite still passes on minimal
//! machines.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use dijitso_jit::{JitContext, JitError, JitRequest};
use dijitso_params::{ParamValue, ParamsOverrides};

fn have_gxx() -> bool {
    std::process::Command::new("g++")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn overrides_for(dir: &Path) -> ParamsOverrides {
    let mut cache = BTreeMap::new();
    cache.insert(
        "cache_dir".to_string(),
        ParamValue::from(dir.to_string_lossy().into_owned()),
    );
    let mut o = ParamsOverrides::new();
    o.insert("cache".to_string(), cache);
    o
}

/// The default flags compile with `-fvisibility=hidden`, so anything the
/// test wants to `dlsym` must be exported explicitly, exactly as generated
/// code does in production.
const EXPORT: &str = "extern \"C\" __attribute__((visibility(\"default\")))";

fn source_returning(value: i32) -> String {
    format!("{EXPORT} int jit_value() {{ return {value}; }}\n")
}

/// Calls the `jit_value` symbol of a loaded library.
fn call_jit_value(lib: &dijitso_cache::LoadedLibrary) -> i32 {
    unsafe {
        let ptr = lib.symbol_ptr("jit_value").unwrap();
        let f: extern "C" fn() -> i32 = std::mem::transmute(ptr);
        f()
    }
}

#[test]
fn cold_build_then_warm_hit() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = JitContext::new();

    let first = ctx
        .jit(
            JitRequest::new("pipeline-a", &7)
                .with_overrides(overrides_for(dir.path()))
                .generate(|_, _, jitable, _| Ok((String::new(), source_returning(*jitable)))),
        )
        .unwrap();
    assert_eq!(call_jit_value(&first), 7);

    // The library landed on disk under the derived signature.
    let lib_dir = dir.path().join("lib");
    let libs: Vec<_> = std::fs::read_dir(&lib_dir).unwrap().collect();
    assert_eq!(libs.len(), 1);

    // A warm call returns the identical handle and never invokes the
    // generator.
    let second = ctx
        .jit(
            JitRequest::new("pipeline-a", &7)
                .with_overrides(overrides_for(dir.path()))
                .generate(|_, _, _: &i32, _| Err("generator must not run on a hit".into())),
        )
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn disk_cache_survives_context_restart() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();

    {
        let mut ctx = JitContext::new();
        ctx.jit(
            JitRequest::new("pipeline-persist", &11)
                .with_overrides(overrides_for(dir.path()))
                .generate(|_, _, jitable, _| Ok((String::new(), source_returning(*jitable)))),
        )
        .unwrap();
    }

    // A fresh context (cold memory tier) must satisfy the request from
    // disk without generating.
    let mut ctx = JitContext::new();
    let lib = ctx
        .jit(
            JitRequest::new("pipeline-persist", &11)
                .with_overrides(overrides_for(dir.path()))
                .generate(|_, _, _: &i32, _| Err("generator must not run on a disk hit".into())),
        )
        .unwrap();
    assert_eq!(call_jit_value(&lib), 11);
}

#[test]
fn build_params_change_module_signature() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = JitContext::new();

    let generate = |_: &str, _: &str, jitable: &i32, _: &dijitso_params::GeneratorParams| {
        Ok((String::new(), source_returning(*jitable)))
    };

    ctx.jit(
        JitRequest::new("pipeline-debug", &3)
            .with_overrides(overrides_for(dir.path()))
            .generate(generate),
    )
    .unwrap();

    let mut debug_overrides = overrides_for(dir.path());
    let mut build = BTreeMap::new();
    build.insert("debug".to_string(), ParamValue::from("true"));
    debug_overrides.insert("build".to_string(), build);

    ctx.jit(
        JitRequest::new("pipeline-debug", &3)
            .with_overrides(debug_overrides)
            .generate(generate),
    )
    .unwrap();

    // Same base signature, different build params: two distinct libraries.
    let libs: Vec<_> = std::fs::read_dir(dir.path().join("lib")).unwrap().collect();
    assert_eq!(libs.len(), 2);
}

#[test]
fn compress_retention_leaves_only_gz() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut overrides = overrides_for(dir.path());
    overrides
        .get_mut("cache")
        .unwrap()
        .insert("src_storage".to_string(), ParamValue::from("compress"));

    let mut ctx = JitContext::new();
    ctx.jit(
        JitRequest::new("pipeline-gz", &5)
            .with_overrides(overrides)
            .generate(|_, _, jitable, _| Ok((String::new(), source_returning(*jitable)))),
    )
    .unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path().join("src"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".cpp.gz"), "got {names:?}");
}

#[test]
fn header_is_stored_and_usable() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = JitContext::new();

    let lib = ctx
        .jit(
            JitRequest::new("pipeline-hdr", &())
                .with_overrides(overrides_for(dir.path()))
                .generate(|_, module_sig, _, _| {
                    let header = "#define JIT_CONSTANT 19\n".to_string();
                    let source = format!(
                        "#include \"{module_sig}.h\"\n{EXPORT} int jit_value() {{ return JIT_CONSTANT; }}\n"
                    );
                    Ok((header, source))
                }),
        )
        .unwrap();

    assert_eq!(call_jit_value(&lib), 19);
    assert_eq!(std::fs::read_dir(dir.path().join("inc")).unwrap().count(), 1);
}

#[test]
fn compile_failure_preserves_reproducer() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = JitContext::new();

    let err = ctx
        .jit(
            JitRequest::new("pipeline-broken", &())
                .with_overrides(overrides_for(dir.path()))
                .generate(|_, _, _, _| {
                    Ok((String::new(), "int jit_value( { syntax error\n".to_string()))
                }),
        )
        .unwrap_err();

    let JitError::Compile {
        signature, status, ..
    } = err
    else {
        panic!("expected a compile error, got {err}");
    };
    assert_ne!(status, 0);

    // No partial artifacts under the cache tree for this signature.
    let lib_entries = std::fs::read_dir(dir.path().join("lib")).unwrap().count();
    assert_eq!(lib_entries, 0);

    // The failure directory reproduces the error when rerun in place.
    let fail_dir = std::path::PathBuf::from(format!("jitfailure-{signature}"));
    assert!(fail_dir.is_dir());
    assert!(fail_dir.join("error.log").exists());
    let command = std::fs::read_to_string(fail_dir.join("command")).unwrap();
    let rerun = std::process::Command::new("sh")
        .arg("-c")
        .arg(command.trim())
        .current_dir(&fail_dir)
        .output()
        .unwrap();
    assert!(!rerun.status.success());

    std::fs::remove_dir_all(&fail_dir).unwrap();
}

#[test]
fn dependent_library_links_through_rpath() {
    if !have_gxx() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = JitContext::new();

    // Build the dependency first.
    ctx.jit(
        JitRequest::new("pipeline-dep", &())
            .with_overrides(overrides_for(dir.path()))
            .generate(|_, _, _, _| {
                Ok((
                    String::new(),
                    format!("{EXPORT} int dep_value() {{ return 40; }}\n"),
                ))
            }),
    )
    .unwrap();
    let dep_signature = ctx
        .module_signature("pipeline-dep", &overrides_for(dir.path()))
        .unwrap();

    // The dependent library calls into it; the embedded rpath lets the
    // dynamic linker find the dependency without any environment help.
    let lib = ctx
        .jit(
            JitRequest::new("pipeline-user", &())
                .with_overrides(overrides_for(dir.path()))
                .with_dependencies(vec![dep_signature])
                .generate(|_, _, _, _| {
                    Ok((
                        String::new(),
                        format!(
                            "extern \"C\" int dep_value();\n\
                             {EXPORT} int jit_value() {{ return dep_value() + 2; }}\n"
                        ),
                    ))
                }),
        )
        .unwrap();

    assert_eq!(call_jit_value(&lib), 42);
}

#[test]
fn received_blob_round_trips() {
    if !have_gxx() {
        return;
    }
    let build_dir = tempfile::tempdir().unwrap();
    let receive_dir = tempfile::tempdir().unwrap();

    // Build on the "sender" side and capture the binary.
    let mut builder_ctx = JitContext::new();
    let mut sent: Vec<u8> = Vec::new();
    builder_ctx
        .jit(
            JitRequest::new("pipeline-ship", &23)
                .with_overrides(overrides_for(build_dir.path()))
                .generate(|_, _, jitable, _| Ok((String::new(), source_returning(*jitable))))
                .send(|bytes| {
                    sent = bytes.to_vec();
                    Ok(())
                }),
        )
        .unwrap();
    assert!(!sent.is_empty());

    // Install the blob on the "receiver" side and use it.
    let mut receiver_ctx = JitContext::new();
    let lib = receiver_ctx
        .jit(
            JitRequest::new("pipeline-ship", &23)
                .with_overrides(overrides_for(receive_dir.path()))
                .receive(move || Ok(sent)),
        )
        .unwrap();
    assert_eq!(call_jit_value(&lib), 23);

    // A follow-up call on the receiver side is a plain cache hit.
    let again = receiver_ctx
        .jit(
            JitRequest::new("pipeline-ship", &23)
                .with_overrides(overrides_for(receive_dir.path()))
                .wait(|| Ok(())),
        )
        .unwrap();
    assert!(Arc::ptr_eq(&lib, &again));
}
