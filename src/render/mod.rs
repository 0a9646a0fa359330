//! Turns a [`DiffOpStream`] into one of the output formats.
//!
//! A [`Dispatcher`] picks exactly one [`Render`] implementation up front and
//! then hands it every operation in order. Framing that belongs to the whole
//! document (the JSON envelope, the final count) is written by the dispatcher.

mod annotated;
mod count;
mod gdiff;
mod json;
mod script;
mod unified;

use std::io::Write;

pub use annotated::AnnotatedRenderer;
pub use count::CountRenderer;
pub use gdiff::GdiffRenderer;
pub use json::JsonRenderer;
pub use script::ScriptRenderer;
pub use unified::UnifiedRenderer;

use crate::{
    cancel::CancelToken,
    diff::{DiffOp, DiffOpStream},
    disasm::{DisasmBackend, Unavailable},
    err::Result,
    palette::Palette,
    util::sha256_hex,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RenderMode {
    /// Offsets and hex pairs of both sides, optionally disassembled
    #[default]
    Annotated,
    /// `-`/`+` lines with hex and escaped text
    Unified,
    /// Write/remove/insert commands replaying the change
    Script,
    /// A JSON document listing every change
    Json,
    /// A binary GDIFF patch
    Gdiff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Only count the operations
    pub count: bool,
    pub color: bool,
    /// Drop the escaped text of unified lines
    pub quiet: bool,
    /// Disassemble both sides in annotated mode
    pub disasm: bool,
    /// Finish GDIFF patches with a copy of the unchanged source tail
    pub gdiff_tail: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            count: false,
            color: false,
            quiet: false,
            disasm: false,
            gdiff_tail: true,
        }
    }
}

/// State shared by all renderers for the length of one run.
#[derive(Debug, Default)]
pub struct RenderState {
    /// Operations handed to the renderer so far
    pub ops: u64,
    /// Operations counted in count mode
    pub count: u64,
    /// Whether a JSON element has been written yet
    pub started: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Input<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// The two buffers being compared.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    pub old: Input<'a>,
    pub new: Input<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub ops: u64,
    pub count: u64,
    pub cancelled: bool,
}

pub trait Render {
    fn begin(&mut self, _inputs: &Inputs<'_>, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, op: &DiffOp<'_>, state: &mut RenderState, out: &mut dyn Write)
    -> Result<()>;

    fn finish(&mut self, _inputs: &Inputs<'_>, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    /// Whether the run may stop between two operations.
    fn cancellable(&self) -> bool {
        true
    }
}

pub struct Dispatcher<'d> {
    mode: RenderMode,
    options: RenderOptions,
    renderer: Box<dyn Render + 'd>,
    cancel: Option<CancelToken>,
}

impl<'d> Dispatcher<'d> {
    pub fn new(mode: RenderMode, options: RenderOptions) -> Self {
        Self::with_backend(mode, options, Box::new(Unavailable))
    }

    pub fn with_backend(
        mode: RenderMode,
        options: RenderOptions,
        backend: Box<dyn DisasmBackend + 'd>,
    ) -> Self {
        let palette = Palette::new(options.color);
        let renderer: Box<dyn Render + 'd> = if options.count {
            Box::new(CountRenderer)
        } else {
            match mode {
                RenderMode::Annotated if options.disasm => {
                    Box::new(AnnotatedRenderer::with_disasm(palette, backend))
                }
                RenderMode::Annotated => Box::new(AnnotatedRenderer::new()),
                RenderMode::Unified => Box::new(UnifiedRenderer::new(palette, options.quiet)),
                RenderMode::Script => Box::new(ScriptRenderer::new(options.disasm)),
                RenderMode::Json => Box::new(JsonRenderer::new(options.disasm)),
                RenderMode::Gdiff => Box::new(GdiffRenderer::new(options.gdiff_tail)),
            }
        };
        log::debug!("rendering as {:?} with {:?}", mode, options);
        Self {
            mode,
            options,
            renderer,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.renderer.cancellable() && self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    /// Renders every operation of `stream`. Consumes the dispatcher so that
    /// backends opened during the run are released when it returns, whether
    /// it succeeded or not.
    pub fn run(
        mut self,
        inputs: &Inputs<'_>,
        stream: &DiffOpStream<'_>,
        out: &mut dyn Write,
    ) -> Result<RenderSummary> {
        let mut state = RenderState::default();
        let mut cancelled = false;

        if self.mode == RenderMode::Json {
            write_json_head(inputs, out)?;
        }
        self.renderer.begin(inputs, out)?;
        for op in stream {
            if self.is_cancelled() {
                log::info!("cancelled after {} of {} operations", state.ops, stream.len());
                cancelled = true;
                break;
            }
            self.renderer.render(op, &mut state, out)?;
            state.ops += 1;
        }
        self.renderer.finish(inputs, out)?;

        if self.mode == RenderMode::Json {
            write!(out, "]")?;
            if self.options.count {
                writeln!(out, ",\"count\":{}}}", state.count)?;
            } else {
                writeln!(out, "}}")?;
            }
        } else if self.options.count {
            writeln!(out, "{}", state.count)?;
        }
        out.flush()?;

        Ok(RenderSummary {
            ops: state.ops,
            count: state.count,
            cancelled,
        })
    }
}

fn write_json_head(inputs: &Inputs<'_>, out: &mut dyn Write) -> Result<()> {
    let file = |input: &Input<'_>| -> Result<String> {
        Ok(format!(
            "{{\"filename\":{},\"size\":{},\"sha256\":\"{}\"}}",
            serde_json::to_string(input.name).map_err(std::io::Error::from)?,
            input.bytes.len(),
            sha256_hex(input.bytes)
        ))
    };
    writeln!(
        out,
        "{{\"files\":[{},\n{}],",
        file(&inputs.old)?,
        file(&inputs.new)?
    )?;
    write!(out, "\"changes\":[")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{
        config::{Config, LogConfig, with_test_config},
        disasm::{Disassembler, Side},
        err::Error,
        gdiff,
        util::test::{create_test_bytes, create_test_pair},
    };

    fn inputs<'a>(old: &'a [u8], new: &'a [u8]) -> Inputs<'a> {
        Inputs {
            old: Input {
                name: "a.bin",
                bytes: old,
            },
            new: Input {
                name: "b.bin",
                bytes: new,
            },
        }
    }

    fn render(mode: RenderMode, options: RenderOptions, old: &[u8], new: &[u8]) -> Vec<u8> {
        let stream = DiffOpStream::from_compare(old, new);
        let mut out = Vec::new();
        Dispatcher::new(mode, options)
            .run(&inputs(old, new), &stream, &mut out)
            .unwrap();
        out
    }

    fn render_text(mode: RenderMode, options: RenderOptions, old: &[u8], new: &[u8]) -> String {
        String::from_utf8(render(mode, options, old, new)).unwrap()
    }

    #[test]
    fn test_count_equals_number_of_ops() {
        let options = RenderOptions {
            count: true,
            ..Default::default()
        };
        let mut old_iter = create_test_bytes(114514);
        let mut new_iter = create_test_bytes(1919810);
        for _ in 0..1_000 {
            let old = old_iter.next().unwrap();
            let new = new_iter.next().unwrap();
            let ops = DiffOpStream::from_compare(&old, &new).len();
            let text = render_text(RenderMode::Unified, options, &old, &new);
            assert_eq!(text, format!("{}\n", ops));
        }
    }

    #[test]
    fn test_json_is_valid_and_has_one_element_per_op() {
        let mut old_iter = create_test_bytes(114514);
        let mut new_iter = create_test_bytes(1919810);
        for _ in 0..1_000 {
            let old = old_iter.next().unwrap();
            let new = new_iter.next().unwrap();
            let ops = DiffOpStream::from_compare(&old, &new).len();
            let text = render_text(RenderMode::Json, RenderOptions::default(), &old, &new);
            let doc: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(doc["changes"].as_array().unwrap().len(), ops);
            assert!(!text.contains("[,"));
            assert!(doc.get("count").is_none());
        }
    }

    #[test]
    fn test_json_document() {
        let text = render_text(
            RenderMode::Json,
            RenderOptions::default(),
            b"ABCDABCD",
            b"ABCXABCD",
        );
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["files"][0]["filename"], "a.bin");
        assert_eq!(doc["files"][0]["size"], 8);
        assert_eq!(
            doc["files"][1]["sha256"].as_str().unwrap(),
            sha256_hex(b"ABCXABCD")
        );
        assert_eq!(
            doc["changes"],
            serde_json::json!([{"offset": 3, "from": "44", "to": "58"}])
        );
    }

    #[test]
    fn test_json_with_count() {
        let options = RenderOptions {
            count: true,
            ..Default::default()
        };
        let text = render_text(RenderMode::Json, options, b"aXbXc", b"aYbYc");
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["count"], 2);
        assert!(doc["changes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_gdiff_round_trip() {
        let mut old_iter = create_test_bytes(114514);
        let mut new_iter = create_test_bytes(1919810);
        for _ in 0..5_000 {
            let old = old_iter.next().unwrap();
            let new = new_iter.next().unwrap();
            let patch = render(RenderMode::Gdiff, RenderOptions::default(), &old, &new);
            assert_eq!(gdiff::apply(&old, &patch).unwrap(), new, "old: {:?}; new: {:?}", old, new);
        }
        for seed in 0..20 {
            let (old, new) = create_test_pair(seed, 70_000, 30);
            let patch = render(RenderMode::Gdiff, RenderOptions::default(), &old, &new);
            assert_eq!(gdiff::apply(&old, &patch).unwrap(), new);
        }
    }

    #[test]
    fn test_gdiff_without_tail_matches_reference_framing() {
        let options = RenderOptions {
            gdiff_tail: false,
            ..Default::default()
        };
        let patch = render(RenderMode::Gdiff, options, b"ABCDABCD", b"ABCXABCD");
        assert_eq!(
            patch,
            vec![0xd1, 0xff, 0xd1, 0xff, 0x04, 249, 0, 0, 3, 1, b'X', 0]
        );
        let patch = render(RenderMode::Gdiff, RenderOptions::default(), b"ABCDABCD", b"ABCXABCD");
        assert_eq!(&patch[11..], &[249, 0, 4, 4, 0]);
    }

    #[test]
    fn test_gdiff_insertion_into_empty() {
        let new = vec![0x41; 300];
        let patch = render(RenderMode::Gdiff, RenderOptions::default(), &[], &new);
        assert_eq!(&patch[..5], &gdiff::MAGIC);
        assert_eq!(&patch[5..8], &[gdiff::DATA_U16, 0x01, 0x2c]);
        assert_eq!(patch.len(), 5 + 3 + 300 + 1);
        assert_eq!(patch[patch.len() - 1], 0);
    }

    #[test]
    fn test_cancel_closes_json_framing() {
        let old = b"aXbXcXd";
        let new = b"aYbYcYd";
        let stream = DiffOpStream::from_compare(old, new);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let summary = Dispatcher::new(RenderMode::Json, RenderOptions::default())
            .with_cancel(cancel)
            .run(&inputs(old, new), &stream, &mut out)
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.ops, 0);
        let doc: Value = serde_json::from_slice(&out).unwrap();
        assert!(doc["changes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_gdiff_ignores_cancel() {
        let (old, new) = create_test_pair(7, 1024, 10);
        let stream = DiffOpStream::from_compare(&old, &new);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let summary = Dispatcher::new(RenderMode::Gdiff, RenderOptions::default())
            .with_cancel(cancel)
            .run(&inputs(&old, &new), &stream, &mut out)
            .unwrap();
        assert!(!summary.cancelled);
        assert_eq!(summary.ops, stream.len() as u64);
        assert_eq!(gdiff::apply(&old, &out).unwrap(), new);
    }

    struct Failing;

    impl DisasmBackend for Failing {
        fn open(&mut self, side: Side) -> Result<Box<dyn Disassembler>> {
            Err(Error::Backend(format!("{} failed", side)))
        }
    }

    #[test]
    fn test_failed_backend_degrades_to_hex() {
        let config = Config {
            log_config: LogConfig::Verbose(0),
        };
        with_test_config(config, || {
            let old = b"aXbXc";
            let new = b"aYbYc";
            let stream = DiffOpStream::from_compare(old, new);
            let options = RenderOptions {
                disasm: true,
                ..Default::default()
            };
            let mut out = Vec::new();
            let summary = Dispatcher::with_backend(RenderMode::Annotated, options, Box::new(Failing))
                .run(&inputs(old, new), &stream, &mut out)
                .unwrap();
            assert_eq!(summary.ops, 2);
            assert_eq!(
                String::from_utf8(out).unwrap(),
                "--- 0x00000001  58\n\
                 - 58\n\
                 +++ 0x00000001  59\n\
                 + 59\n\
                 --- 0x00000003  58\n\
                 - 58\n\
                 +++ 0x00000003  59\n\
                 + 59\n"
            );
        });
    }
}
