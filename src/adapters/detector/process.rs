//! Detector running as a long-lived child process.
//!
//! Protocol, one exchange per frame:
//! - request: a JSON header line `{"width":W,"height":H,"threshold":T,"len":N}`
//!   followed by `N` bytes of packed RGB24 pixels;
//! - response: one JSON line holding an array of
//!   `{"label":..,"confidence":..,"bbox":[x,y,w,h]}` objects.
//!
//! The model is loaded once when the process starts.

use crate::domain::{Detection, Frame};
use crate::ports::Detector;
use serde::Serialize;
use std::error::Error;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct FrameHeader {
    width: u32,
    height: u32,
    threshold: f32,
    len: usize,
}

pub fn write_request<W: Write>(writer: &mut W, frame: &Frame, threshold: f32) -> io::Result<()> {
    let header = FrameHeader {
        width: frame.width,
        height: frame.height,
        threshold,
        len: frame.pixels.len(),
    };
    serde_json::to_writer(&mut *writer, &header)?;
    writer.write_all(b"\n")?;
    writer.write_all(&frame.pixels)?;
    writer.flush()
}

pub fn parse_response(line: &str) -> Result<Vec<Detection>, serde_json::Error> {
    serde_json::from_str(line.trim())
}

pub struct ProcessDetector {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProcessDetector {
    pub fn spawn(program: &str, args: &[String]) -> io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "detector stdin unavailable")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "detector stdout unavailable")
        })?;

        info!("Detector started: {} (pid {})", program, child.id());
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl Detector for ProcessDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn Error + Send + Sync>> {
        write_request(&mut self.stdin, frame, threshold)?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err("detector process closed its output".into());
        }
        Ok(parse_response(&line)?)
    }
}

impl Drop for ProcessDetector {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!("Could not stop detector process: {}", e);
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame {
            width: 2,
            height: 1,
            pixels: vec![11, 20, 30, 40, 50, 60],
        }
    }

    #[test]
    fn test_request_is_header_line_then_pixels() {
        let mut buffer = Vec::new();
        write_request(&mut buffer, &frame(), 0.5).unwrap();

        let newline = buffer.iter().position(|&b| b == b'\n').unwrap();
        let header: serde_json::Value = serde_json::from_slice(&buffer[..newline]).unwrap();
        assert_eq!(header["width"], 2);
        assert_eq!(header["height"], 1);
        assert_eq!(header["threshold"], 0.5);
        assert_eq!(header["len"], 6);
        assert_eq!(&buffer[newline + 1..], &[11, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_parse_response() {
        let line = "[{\"label\":\"kill\",\"confidence\":0.75,\"bbox\":[0,0,4,4]}]\n";
        let detections = parse_response(line).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "kill");
        assert_eq!(detections[0].confidence, 0.75);

        assert!(parse_response("[]").unwrap().is_empty());
        assert!(parse_response("not json").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_with_child_process() {
        // Reads the header, drops the pixels, answers with a fixed result.
        let script = r#"while IFS= read -r header; do
            len=$(printf '%s' "$header" | sed 's/.*"len":\([0-9]*\).*/\1/')
            head -c "$len" > /dev/null
            echo '[{"label":"kill","confidence":0.9}]'
        done"#;
        let mut detector =
            ProcessDetector::spawn("sh", &["-c".to_string(), script.to_string()]).unwrap();

        for _ in 0..2 {
            let detections = detector.detect(&frame(), 0.5).unwrap();
            assert_eq!(detections, vec![Detection::new("kill", 0.9)]);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_process_is_error() {
        let mut detector =
            ProcessDetector::spawn("sh", &["-c".to_string(), "exit 0".to_string()]).unwrap();
        assert!(detector.detect(&frame(), 0.5).is_err());
    }
}
