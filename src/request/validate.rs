use std::collections::HashSet;
use std::fmt;

use crate::foundation::core::MAX_PIPES;
use crate::foundation::error::{LayeringError, LayeringResult};
use crate::layering::layer::{DisplayMode, LayerCaps};
use crate::request::model::{LayerDesc, LayeringRequest, PipeRequest, UNSET};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathElem {
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct RequestError {
    pub(crate) path: Vec<PathElem>,
    pub(crate) message: String,
}

impl RequestError {
    fn at(path: &[PathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[PathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            PathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            PathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

#[derive(Debug, Clone)]
pub(crate) struct RequestErrors {
    pub(crate) errors: Vec<RequestError>,
}

impl fmt::Display for RequestErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

/// Check every precondition of a request without touching it.
pub(crate) fn validate_request(req: &LayeringRequest) -> LayeringResult<()> {
    collect_errors(req).map_err(|e| LayeringError::invalid_argument(e.to_string()))
}

pub(crate) fn collect_errors(req: &LayeringRequest) -> Result<(), RequestErrors> {
    let mut errors = Vec::new();

    if req.pipes.len() > MAX_PIPES {
        errors.push(RequestError::at(
            &[PathElem::Field("pipes")],
            format!("at most {MAX_PIPES} pipes per frame, got {}", req.pipes.len()),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, pipe) in req.pipes.iter().enumerate() {
        let mut path = vec![PathElem::Field("pipes"), PathElem::Index(idx)];
        validate_pipe(pipe, &mut path, &mut seen, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RequestErrors { errors })
    }
}

fn validate_pipe(
    pipe: &PipeRequest,
    path: &mut Vec<PathElem>,
    seen: &mut HashSet<u32>,
    errors: &mut Vec<RequestError>,
) {
    if pipe.pipe as usize >= MAX_PIPES {
        errors.push(RequestError::at(
            &field(path.as_slice(), "pipe"),
            format!("pipe index {} out of range 0..{MAX_PIPES}", pipe.pipe),
        ));
    } else if !seen.insert(pipe.pipe) {
        errors.push(RequestError::at(
            &field(path.as_slice(), "pipe"),
            format!("pipe {} listed more than once", pipe.pipe),
        ));
    }

    if DisplayMode::from_code(pipe.mode).is_none() {
        errors.push(RequestError::at(
            &field(path.as_slice(), "mode"),
            format!("unknown display mode {}", pipe.mode),
        ));
    }

    let count = pipe.layers.len();
    if pipe.layer_count < 0 {
        errors.push(RequestError::at(
            &field(path.as_slice(), "layer_count"),
            "layer_count must be non-negative",
        ));
    } else if pipe.layer_count as usize != count {
        errors.push(RequestError::at(
            &field(path.as_slice(), "layer_count"),
            format!(
                "layer_count {} does not match {count} layers",
                pipe.layer_count
            ),
        ));
    }

    match (pipe.gles_head, pipe.gles_tail) {
        (UNSET, UNSET) => {}
        (head, tail) if head >= 0 && head <= tail && (tail as usize) < count => {}
        (head, tail) => errors.push(RequestError::at(
            &field(path.as_slice(), "gles_tail"),
            format!("window [{head}, {tail}] invalid for {count} layers"),
        )),
    }

    path.push(PathElem::Field("layers"));
    for (idx, layer) in pipe.layers.iter().enumerate() {
        path.push(PathElem::Index(idx));
        validate_layer(layer, path, errors);
        path.pop();
    }
    path.pop();
}

fn field(path: &[PathElem], name: &'static str) -> Vec<PathElem> {
    let mut p = path.to_vec();
    p.push(PathElem::Field(name));
    p
}

fn validate_layer(layer: &LayerDesc, path: &[PathElem], errors: &mut Vec<RequestError>) {
    let at = |name: &'static str, message: String| RequestError::at(&field(path, name), message);

    match LayerCaps::from_bits(layer.caps) {
        None => errors.push(at("caps", format!("unknown capability bits {:#x}", layer.caps))),
        Some(caps) if caps.contains(LayerCaps::CLEAR_CAPABLE) && caps.is_offload() => {
            errors.push(at("caps", "a clear-capable layer cannot be offloaded".to_string()))
        }
        Some(_) => {}
    }
    for (name, rect) in [("src", layer.src), ("dst", layer.dst)] {
        if u64::from(rect[0]) + u64::from(rect[2]) > u64::from(u32::MAX)
            || u64::from(rect[1]) + u64::from(rect[3]) > u64::from(u32::MAX)
        {
            errors.push(at(name, "rectangle extends past the coordinate range".to_string()));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/request/validate.rs"]
mod tests;
