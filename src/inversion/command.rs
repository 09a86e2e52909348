use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::{InversionError, PigmentInversion, Pigments, PixelSpectrum};

/// One request line sent to the inversion program. NaN entries are written
/// as `null`.
#[derive(Debug, Serialize)]
struct Request<'a> {
    rrs: &'a [f64],
    rrs_unc: &'a [f64],
    wavelengths: &'a [f64],
    temperature: f64,
    salinity: f64,
}

/// One response line: either result groups or an error message.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Response {
    Pigments { pigments: Vec<Pigments> },
    Error { error: String },
}

struct ChildIo {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Drives an external inversion program over line-delimited JSON on its
/// standard input and output. The program is started once and kept alive
/// for the whole run; calls are serialized.
pub struct CommandInversion {
    program: String,
    io: Mutex<ChildIo>,
}

impl CommandInversion {
    pub fn spawn<S: AsRef<str>>(command: &[S]) -> Result<Self, InversionError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| InversionError::Failed("empty inversion command".to_string()))?;
        let program = program.as_ref().to_string();

        let mut child = Command::new(&program)
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| InversionError::Failed("inversion stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| InversionError::Failed("inversion stdout unavailable".to_string()))?;

        info!(program = %program, pid = child.id(), "inversion process started");

        Ok(Self {
            program,
            io: Mutex::new(ChildIo {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            }),
        })
    }
}

impl PigmentInversion for CommandInversion {
    fn invert(&self, pixel: &PixelSpectrum<'_>) -> Result<Vec<Pigments>, InversionError> {
        let request = Request {
            rrs: pixel.rrs,
            rrs_unc: pixel.rrs_unc,
            wavelengths: pixel.wavelengths,
            temperature: pixel.temperature,
            salinity: pixel.salinity,
        };
        let mut line = serde_json::to_string(&request)?;
        line.push('\n');

        let mut io = self
            .io
            .lock()
            .map_err(|_| InversionError::Failed("inversion process lock poisoned".to_string()))?;

        io.stdin.write_all(line.as_bytes())?;
        io.stdin.flush()?;

        let mut answer = String::new();
        if io.stdout.read_line(&mut answer)? == 0 {
            return Err(InversionError::Failed(format!(
                "{} closed its output",
                self.program
            )));
        }
        debug!(response = answer.trim_end(), "inversion response");

        match serde_json::from_str(&answer)? {
            Response::Pigments { pigments } => Ok(pigments),
            Response::Error { error } => Err(InversionError::Failed(error)),
        }
    }
}

impl Drop for CommandInversion {
    fn drop(&mut self) {
        if let Ok(io) = self.io.get_mut() {
            if let Err(e) = io.child.kill() {
                warn!(program = %self.program, error = %e, "could not stop inversion process");
            }
            let _ = io.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_writes_nan_as_null() {
        let request = Request {
            rrs: &[0.01, f64::NAN],
            rrs_unc: &[0.001, 0.002],
            wavelengths: &[443.0, 490.0],
            temperature: 10.0,
            salinity: 34.5,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""rrs":[0.01,null]"#), "{json}");
        assert!(json.contains(r#""salinity":34.5"#));
    }

    #[test]
    fn test_response_variants() {
        let ok: Response = serde_json::from_str(r#"{"pigments": [[1.0, 2.0, 3.0, 4.0]]}"#).unwrap();
        assert!(matches!(ok, Response::Pigments { ref pigments } if pigments[0].chlc == 3.0));

        let err: Response = serde_json::from_str(r#"{"error": "did not converge"}"#).unwrap();
        assert!(matches!(err, Response::Error { ref error } if error == "did not converge"));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let command: [&str; 0] = [];
        assert!(matches!(
            CommandInversion::spawn(&command),
            Err(InversionError::Failed(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_through_shell_program() {
        // Answers every request line with a fixed result group
        let script = r#"while read -r line; do echo '{"pigments": [[1.0, 2.0, 3.0, 4.0]]}'; done"#;
        let inversion = CommandInversion::spawn(&["sh", "-c", script]).unwrap();
        let pixel = PixelSpectrum {
            rrs: &[0.01, 0.02],
            rrs_unc: &[0.001, 0.002],
            wavelengths: &[443.0, 490.0],
            temperature: 10.0,
            salinity: 34.0,
        };
        for _ in 0..3 {
            let groups = inversion.invert(&pixel).unwrap();
            assert_eq!(groups, vec![Pigments::from([1.0, 2.0, 3.0, 4.0])]);
        }
    }
}
