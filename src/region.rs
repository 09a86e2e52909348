//! Interactive boundary-box selection.
//!
//! The operator is asked for north, south, east and west in that order. Each
//! bound must parse as a number and fall strictly inside its limits; the
//! limits of south and west are narrowed by the north and east already
//! accepted. Once the four bounds are in, the box is checked against the swath
//! navigation and, if no pixel falls inside it, the whole sequence starts
//! again. Only coordinates are needed; reflectance is read afterwards for the
//! accepted window.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

use crate::bbox::{BoundingBox, Extent};
use crate::swath::{Navigation, SwathWindow};

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("operator input closed before a boundary box was accepted")]
    InputClosed,
    #[error("swath has no valid coordinates")]
    NoCoverage,
    #[error("boundary box {bbox:?} is not strictly inside swath coverage {extent:?}")]
    OutsideCoverage { bbox: BoundingBox, extent: Extent },
    #[error("no swath pixel falls inside the boundary box")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
            Direction::East => write!(f, "east"),
            Direction::West => write!(f, "west"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum BoundError {
    NotANumber,
    OutOfRange,
}

/// Parses one operator answer and checks `lower < value < upper`.
pub fn parse_bound(input: &str, lower: f64, upper: f64) -> Result<f64, BoundError> {
    let value: f64 = input.trim().parse().map_err(|_| BoundError::NotANumber)?;
    if value < upper && value > lower {
        Ok(value)
    } else {
        Err(BoundError::OutOfRange)
    }
}

/// Terminal-style operator: reads answers from `input`, writes prompts and
/// messages to `output`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes `prompt` and returns the next answer line, `None` on EOF.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    pub fn tell(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

/// Accepted selection: the box and the window of swath pixels it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSelection {
    pub bbox: BoundingBox,
    pub window: SwathWindow,
}

#[derive(Debug)]
enum SelectionState {
    AwaitNorth,
    AwaitSouth { north: f64 },
    AwaitEast { north: f64, south: f64 },
    AwaitWest { north: f64, south: f64, east: f64 },
    ValidateBox(BoundingBox),
    Accepted(RegionSelection),
}

pub struct RegionSelector<'a> {
    navigation: &'a Navigation,
    extent: Extent,
}

impl<'a> RegionSelector<'a> {
    pub fn new(navigation: &'a Navigation) -> Result<Self, RegionError> {
        let extent = navigation.extent().ok_or(RegionError::NoCoverage)?;
        Ok(Self { navigation, extent })
    }

    /// Runs the prompt sequence until a box covers at least one pixel.
    pub fn select<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<RegionSelection, RegionError> {
        let Extent {
            north: n_bound,
            south: s_bound,
            east: e_bound,
            west: w_bound,
        } = self.extent;

        console.tell(&format!(
            "The downloaded L2 file has latitude boundaries {} to {}, longitude boundaries {} to {}",
            n_bound, s_bound, e_bound, w_bound
        ))?;
        console.tell("Select a boundary box within these coordinates to calculate pigments for")?;

        let mut state = SelectionState::AwaitNorth;
        loop {
            debug!(?state, "region selection");
            state = match state {
                SelectionState::AwaitNorth => {
                    let north = ask_bound(console, Direction::North, s_bound, n_bound)?;
                    SelectionState::AwaitSouth { north }
                }
                SelectionState::AwaitSouth { north } => {
                    let south = ask_bound(console, Direction::South, s_bound, north)?;
                    SelectionState::AwaitEast { north, south }
                }
                SelectionState::AwaitEast { north, south } => {
                    let east = ask_bound(console, Direction::East, w_bound, e_bound)?;
                    SelectionState::AwaitWest { north, south, east }
                }
                SelectionState::AwaitWest { north, south, east } => {
                    let west = ask_bound(console, Direction::West, w_bound, east)?;
                    // Bounds are limited by the swath coverage, not by the
                    // -180..180 convention.
                    match BoundingBox::ordered(north, south, east, west) {
                        Ok(bbox) => SelectionState::ValidateBox(bbox),
                        Err(e) => {
                            info!(error = %e, "boundary box rejected, restarting selection");
                            console.tell(&format!("Invalid boundary box: {}.", e))?;
                            SelectionState::AwaitNorth
                        }
                    }
                }
                SelectionState::ValidateBox(bbox) => {
                    match self.navigation.window(&bbox) {
                        Some(window) => SelectionState::Accepted(RegionSelection { bbox, window }),
                        None => {
                            info!(?bbox, "no pixel inside boundary box, restarting selection");
                            console.tell(
                                "Could not create boundary box. This is most likely due to the PACE level 2 data file's coordinate system not being gridded.",
                            )?;
                            console.tell("Try increasing the size of the boundary box.")?;
                            SelectionState::AwaitNorth
                        }
                    }
                }
                SelectionState::Accepted(selection) => {
                    info!(bbox = ?selection.bbox, window = ?selection.window, "boundary box accepted");
                    return Ok(selection);
                }
            };
        }
    }

    /// Non-interactive path: the configured box must lie strictly inside
    /// the swath coverage, as the prompts require, and is checked once.
    pub fn select_fixed(&self, bbox: &BoundingBox) -> Result<RegionSelection, RegionError> {
        if !self.extent.strictly_contains(bbox) {
            return Err(RegionError::OutsideCoverage {
                bbox: *bbox,
                extent: self.extent,
            });
        }

        let window = self.navigation.window(bbox).ok_or(RegionError::Empty)?;
        Ok(RegionSelection {
            bbox: *bbox,
            window,
        })
    }
}

fn ask_bound<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    direction: Direction,
    lower: f64,
    upper: f64,
) -> Result<f64, RegionError> {
    loop {
        let prompt = format!("{} (between {} and {}): ", direction, upper, lower);
        let Some(answer) = console.ask(&prompt)? else {
            return Err(RegionError::InputClosed);
        };

        match parse_bound(&answer, lower, upper) {
            Ok(value) => return Ok(value),
            Err(BoundError::NotANumber) => console.tell("Must enter a float.")?,
            Err(BoundError::OutOfRange) => {
                console.tell(&format!("Value must be between {} and {}.", upper, lower))?
            }
        }
    }
}
