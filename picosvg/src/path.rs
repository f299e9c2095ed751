//! The path command model and its rewrites.
//!
//! A [`Path`] is always held exploded: one [`PathCommand`] per group of
//! arguments. Rewrites are folds over the commands that carry the pen
//! position along, see [`Path::rewrite`].

use std::{fmt::Display, str::FromStr};

use kurbo::{BezPath, PathEl};
use svgpathops::FillRule;

use crate::{
    affine::Affine2D,
    arc::{arc_to_cubic, ArcSegment, EllipticalArc},
    error::Error,
    geometry::{
        ntos, round_multiple, round_scalar, AlmostEqual, Point, Rect,
        DEFAULT_ALMOST_EQUAL_TOLERANCE,
    },
    path_data,
};

/// The maximum number of arguments any command takes
const MAX_ARGS: usize = 7;

/// Rewritten endpoints this close to the subpath start are snapped onto it
const SNAP_TOLERANCE: f64 = DEFAULT_ALMOST_EQUAL_TOLERANCE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    MoveTo,
    LineTo,
    HorizontalTo,
    VerticalTo,
    CurveTo,
    QuadTo,
    SmoothCurveTo,
    SmoothQuadTo,
    ArcTo,
    ClosePath,
}

impl CommandKind {
    /// The kind and whether it is relative, None if not a command letter.
    pub fn from_letter(letter: char) -> Option<(CommandKind, bool)> {
        let kind = match letter.to_ascii_uppercase() {
            'M' => CommandKind::MoveTo,
            'L' => CommandKind::LineTo,
            'H' => CommandKind::HorizontalTo,
            'V' => CommandKind::VerticalTo,
            'C' => CommandKind::CurveTo,
            'Q' => CommandKind::QuadTo,
            'S' => CommandKind::SmoothCurveTo,
            'T' => CommandKind::SmoothQuadTo,
            'A' => CommandKind::ArcTo,
            'Z' => CommandKind::ClosePath,
            _ => return None,
        };
        Some((kind, letter.is_ascii_lowercase()))
    }

    /// The absolute letter
    pub fn letter(self) -> char {
        match self {
            CommandKind::MoveTo => 'M',
            CommandKind::LineTo => 'L',
            CommandKind::HorizontalTo => 'H',
            CommandKind::VerticalTo => 'V',
            CommandKind::CurveTo => 'C',
            CommandKind::QuadTo => 'Q',
            CommandKind::SmoothCurveTo => 'S',
            CommandKind::SmoothQuadTo => 'T',
            CommandKind::ArcTo => 'A',
            CommandKind::ClosePath => 'Z',
        }
    }

    pub fn arity(self) -> usize {
        match self {
            CommandKind::ClosePath => 0,
            CommandKind::HorizontalTo | CommandKind::VerticalTo => 1,
            CommandKind::MoveTo | CommandKind::LineTo | CommandKind::SmoothQuadTo => 2,
            CommandKind::QuadTo | CommandKind::SmoothCurveTo => 4,
            CommandKind::CurveTo => 6,
            CommandKind::ArcTo => 7,
        }
    }

    /// Indices of the x and of the y coordinates among the arguments.
    pub fn coord_indices(self) -> (&'static [usize], &'static [usize]) {
        match self {
            CommandKind::MoveTo | CommandKind::LineTo | CommandKind::SmoothQuadTo => (&[0], &[1]),
            CommandKind::HorizontalTo => (&[0], &[]),
            CommandKind::VerticalTo => (&[], &[0]),
            CommandKind::CurveTo => (&[0, 2, 4], &[1, 3, 5]),
            CommandKind::QuadTo | CommandKind::SmoothCurveTo => (&[0, 2], &[1, 3]),
            CommandKind::ArcTo => (&[5], &[6]),
            CommandKind::ClosePath => (&[], &[]),
        }
    }
}

/// One drawing command with a fixed number of arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathCommand {
    pub kind: CommandKind,
    pub relative: bool,
    args: [f64; MAX_ARGS],
}

impl PathCommand {
    /// Takes as many of `args` as `kind` needs, missing ones are 0.
    pub fn new(kind: CommandKind, relative: bool, args: &[f64]) -> PathCommand {
        let mut buf = [0.0; MAX_ARGS];
        let n = kind.arity().min(args.len());
        buf[..n].copy_from_slice(&args[..n]);
        PathCommand {
            kind,
            relative,
            args: buf,
        }
    }

    pub fn absolute(kind: CommandKind, args: &[f64]) -> PathCommand {
        PathCommand::new(kind, false, args)
    }

    pub fn args(&self) -> &[f64] {
        &self.args[..self.kind.arity()]
    }

    pub fn args_mut(&mut self) -> &mut [f64] {
        &mut self.args[..self.kind.arity()]
    }

    pub fn letter(&self) -> char {
        let letter = self.kind.letter();
        if self.relative {
            letter.to_ascii_lowercase()
        } else {
            letter
        }
    }

    /// Where the pen is after this command, given where it was before.
    ///
    /// Close is not handled here, it returns to the subpath start which the
    /// command alone doesn't know.
    pub fn next_pos(&self, current: Point) -> Point {
        let (xs, ys) = self.kind.coord_indices();
        let mut next = current;
        if !self.relative {
            if !xs.is_empty() {
                next.x = 0.0;
            }
            if !ys.is_empty() {
                next.y = 0.0;
            }
        }
        if let Some(i) = xs.last() {
            next.x += self.args[*i];
        }
        if let Some(i) = ys.last() {
            next.y += self.args[*i];
        }
        next
    }

    /// Offset every coordinate, x by `dx` and y by `dy`
    fn offset_coords(&mut self, dx: f64, dy: f64) {
        let (xs, ys) = self.kind.coord_indices();
        for i in xs {
            self.args[*i] += dx;
        }
        for i in ys {
            self.args[*i] += dy;
        }
    }

    fn to_absolute(mut self, current: Point) -> PathCommand {
        if self.relative {
            self.relative = false;
            self.offset_coords(current.x, current.y);
        }
        self
    }

    fn to_relative(mut self, current: Point) -> PathCommand {
        if !self.relative {
            self.relative = true;
            self.offset_coords(-current.x, -current.y);
        }
        self
    }

    /// H/V become L, other commands are unchanged.
    fn explicit_line(self, current: Point) -> PathCommand {
        let args = match (self.kind, self.relative) {
            (CommandKind::HorizontalTo, true) => [self.args[0], 0.0],
            (CommandKind::HorizontalTo, false) => [self.args[0], current.y],
            (CommandKind::VerticalTo, true) => [0.0, self.args[0]],
            (CommandKind::VerticalTo, false) => [current.x, self.args[0]],
            _ => return self,
        };
        PathCommand::new(CommandKind::LineTo, self.relative, &args)
    }

    /// Alter the command so it ends exactly at `end`.
    fn move_endpoint(self, current: Point, end: Point) -> PathCommand {
        let mut cmd = self.explicit_line(current);
        let (xs, ys) = cmd.kind.coord_indices();
        if let (Some(x), Some(y)) = (xs.last(), ys.last()) {
            let end = if cmd.relative {
                (end - current).to_point()
            } else {
                end
            };
            cmd.args[*x] = end.x;
            cmd.args[*y] = end.y;
        }
        cmd
    }

    fn map_args(mut self, f: impl Fn(f64) -> f64) -> PathCommand {
        self.args_mut().iter_mut().for_each(|v| *v = f(*v));
        self
    }
}

impl Display for PathCommand {
    /// Coordinate pairs are joined by commas, everything else by spaces.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())?;
        let (xs, ys) = self.kind.coord_indices();
        let args = self.args();
        let mut i = 0;
        let mut first = true;
        while i < args.len() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            let pair_at = xs.iter().zip(ys).any(|(x, y)| *x == i && *y == i + 1);
            if pair_at {
                write!(f, "{},{}", ntos(args[i]), ntos(args[i + 1]))?;
                i += 2;
            } else {
                f.write_str(&ntos(args[i]))?;
                i += 1;
            }
        }
        Ok(())
    }
}

/// The pen as seen by a [`Path::rewrite`] step.
#[derive(Debug, Clone, Copy)]
pub struct PenState {
    /// Where a close takes the pen
    pub subpath_start: Point,
    pub current: Point,
    /// The last command emitted and where the pen was before it
    pub previous: Option<(Point, PathCommand)>,
}

/// A sequence of path commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Path {
        Path::default()
    }

    pub fn from_commands(commands: impl IntoIterator<Item = PathCommand>) -> Path {
        Path {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: PathCommand) -> &mut Path {
        self.commands.push(command);
        self
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Path {
        self.push(PathCommand::absolute(CommandKind::MoveTo, &[x, y]))
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Path {
        self.push(PathCommand::absolute(CommandKind::LineTo, &[x, y]))
    }

    pub fn horizontal_to(&mut self, x: f64) -> &mut Path {
        self.push(PathCommand::absolute(CommandKind::HorizontalTo, &[x]))
    }

    pub fn vertical_to(&mut self, y: f64) -> &mut Path {
        self.push(PathCommand::absolute(CommandKind::VerticalTo, &[y]))
    }

    /// An unrotated clockwise arc.
    pub fn arc_to(&mut self, rx: f64, ry: f64, x: f64, y: f64, large: bool) -> &mut Path {
        let large = if large { 1.0 } else { 0.0 };
        self.push(PathCommand::absolute(
            CommandKind::ArcTo,
            &[rx, ry, 0.0, large, 1.0, x, y],
        ))
    }

    pub fn close(&mut self) -> &mut Path {
        self.push(PathCommand::absolute(CommandKind::ClosePath, &[]))
    }

    /// True if nothing but moves; a pen that only moves can't draw.
    pub fn only_moves(&self) -> bool {
        self.commands.iter().all(|c| c.kind == CommandKind::MoveTo)
    }

    /// Fold over the commands, replacing each with what `rewrite_fn` returns.
    ///
    /// The pen state tracks the emitted commands, not the input ones. A
    /// leading relative move is treated as absolute.
    pub fn rewrite<F>(&self, mut rewrite_fn: F) -> Path
    where
        F: FnMut(&PenState, PathCommand) -> Vec<PathCommand>,
    {
        let mut state = PenState {
            subpath_start: Point::ZERO,
            current: Point::ZERO,
            previous: None,
        };
        let mut commands = Vec::with_capacity(self.commands.len());
        for (idx, cmd) in self.commands.iter().enumerate() {
            let mut cmd = *cmd;
            if idx == 0 && cmd.kind == CommandKind::MoveTo {
                cmd.relative = false;
            }
            for new_cmd in rewrite_fn(&state, cmd) {
                let next_pos = match new_cmd.kind {
                    CommandKind::ClosePath => state.subpath_start,
                    _ => new_cmd.next_pos(state.current),
                };
                let prev_pos = std::mem::replace(&mut state.current, next_pos);
                if new_cmd.kind == CommandKind::MoveTo {
                    state.subpath_start = next_pos;
                }
                state.previous = Some((prev_pos, new_cmd));
                commands.push(new_cmd);
            }
        }
        Path { commands }
    }

    /// Convert each command, snapping to the subpath start if the result
    /// lands within float error of it.
    fn rewrite_coords(&self, convert: impl Fn(PathCommand, Point) -> PathCommand) -> Path {
        self.rewrite(|state, cmd| {
            let mut new_cmd = convert(cmd, state.current);
            let next_pos = new_cmd.next_pos(state.current);
            if next_pos != state.subpath_start
                && next_pos.almost_equals(&state.subpath_start, SNAP_TOLERANCE)
            {
                new_cmd = new_cmd.move_endpoint(state.current, state.subpath_start);
            }
            vec![new_cmd]
        })
    }

    /// Equivalent path with only absolute commands.
    pub fn absolute(&self) -> Path {
        self.rewrite_coords(PathCommand::to_absolute)
    }

    /// Equivalent path with only relative commands.
    pub fn relative(&self) -> Path {
        self.rewrite_coords(PathCommand::to_relative)
    }

    /// Replace horizontal and vertical lines with line to (x,y).
    pub fn explicit_lines(&self) -> Path {
        self.rewrite(|state, cmd| vec![cmd.explicit_line(state.current)])
    }

    /// Rewrite shorthand curves, S and T, as their explicit counterparts.
    ///
    /// The implied control point is the reflection of the previous curve's
    /// last control point, or the current point if the previous command
    /// isn't a curve of the same family.
    ///
    /// See <https://www.w3.org/TR/SVG11/paths.html#PathDataCurveCommands>
    pub fn expand_shorthand(&self) -> Path {
        self.rewrite(|state, cmd| {
            let long_kind = match cmd.kind {
                CommandKind::SmoothCurveTo => CommandKind::CurveTo,
                CommandKind::SmoothQuadTo => CommandKind::QuadTo,
                _ => return vec![cmd],
            };
            let cmd = cmd.to_absolute(state.current);
            let current = state.current;

            let mut control = current;
            if let Some((prev_pos, prev_cmd)) = state.previous {
                let prev_cmd = prev_cmd.to_absolute(prev_pos);
                if prev_cmd.kind == long_kind {
                    let prev_args = prev_cmd.args();
                    let n = prev_args.len();
                    let prev_control = Point::new(prev_args[n - 4], prev_args[n - 3]);
                    control = Point::new(
                        2.0 * current.x - prev_control.x,
                        2.0 * current.y - prev_control.y,
                    );
                }
            }
            let mut args = vec![control.x, control.y];
            args.extend_from_slice(cmd.args());
            vec![PathCommand::absolute(long_kind, &args)]
        })
    }

    /// Replace all arcs with cubics, or lines for straight-line arcs.
    pub fn arcs_to_cubics(&self) -> Path {
        self.rewrite(|state, cmd| {
            if cmd.kind != CommandKind::ArcTo {
                return vec![cmd];
            }
            let [rx, ry, rotation, large, sweep, mut end_x, mut end_y] = cmd.args;
            if cmd.relative {
                end_x += state.current.x;
                end_y += state.current.y;
            }
            let arc = EllipticalArc {
                start: state.current,
                rx,
                ry,
                rotation,
                large: large != 0.0,
                sweep: sweep != 0.0,
                end: Point::new(end_x, end_y),
            };
            arc_to_cubic(arc)
                .into_iter()
                .map(|segment| match segment {
                    ArcSegment::Line(end) => {
                        PathCommand::absolute(CommandKind::LineTo, &[end.x, end.y])
                    }
                    ArcSegment::Cubic(c1, c2, end) => PathCommand::absolute(
                        CommandKind::CurveTo,
                        &[c1.x, c1.y, c2.x, c2.y, end.x, end.y],
                    ),
                })
                .collect()
        })
    }

    /// Absolute moves, lines, cubics, quadratics and closes only.
    pub fn canonical(&self) -> Path {
        self.explicit_lines()
            .expand_shorthand()
            .absolute()
            .arcs_to_cubics()
    }

    /// Shift by (dx, dy). Relative commands are unaffected.
    pub fn move_by(&self, dx: f64, dy: f64) -> Path {
        self.rewrite(|_, mut cmd| {
            if !cmd.relative {
                cmd.offset_coords(dx, dy);
            }
            vec![cmd]
        })
    }

    /// The canonical form with every point mapped through `transform`.
    pub fn transform(&self, transform: &Affine2D) -> Path {
        let mut path = self.canonical();
        for cmd in path.commands.iter_mut() {
            let (xs, ys) = cmd.kind.coord_indices();
            for (x, y) in xs.iter().zip(ys.iter()) {
                let pt = transform.map_point((cmd.args[*x], cmd.args[*y]));
                cmd.args[*x] = pt.x;
                cmd.args[*y] = pt.y;
            }
        }
        path
    }

    pub fn round_floats(&self, ndigits: u32) -> Path {
        self.map_args(|v| round_scalar(v, ndigits))
    }

    pub fn round_multiple(&self, multiple_of: f64) -> Path {
        self.map_args(|v| round_multiple(v, multiple_of))
    }

    fn map_args(&self, f: impl Fn(f64) -> f64) -> Path {
        Path::from_commands(self.commands.iter().map(|c| c.map_args(&f)))
    }

    /// Same commands with every argument within `tolerance`.
    pub fn almost_equals(&self, other: &Path, tolerance: f64) -> bool {
        self.commands.len() == other.commands.len()
            && self.commands.iter().zip(&other.commands).all(|(l, r)| {
                l.kind == r.kind
                    && l.relative == r.relative
                    && l.args()
                        .iter()
                        .zip(r.args())
                        .all(|(lv, rv)| lv.almost_equals(rv, tolerance))
            })
    }

    /// The kurbo equivalent of the canonical form.
    pub fn to_bez_path(&self) -> BezPath {
        let mut bez = BezPath::new();
        for cmd in self.canonical().commands {
            let a = cmd.args;
            match cmd.kind {
                CommandKind::MoveTo => bez.move_to((a[0], a[1])),
                CommandKind::LineTo => bez.line_to((a[0], a[1])),
                CommandKind::QuadTo => bez.quad_to((a[0], a[1]), (a[2], a[3])),
                CommandKind::CurveTo => bez.curve_to((a[0], a[1]), (a[2], a[3]), (a[4], a[5])),
                CommandKind::ClosePath => bez.close_path(),
                // canonical() leaves nothing else behind
                _ => (),
            }
        }
        bez
    }

    pub fn from_bez_path(bez: &BezPath) -> Path {
        Path::from_commands(bez.elements().iter().map(|el| match *el {
            PathEl::MoveTo(p) => PathCommand::absolute(CommandKind::MoveTo, &[p.x, p.y]),
            PathEl::LineTo(p) => PathCommand::absolute(CommandKind::LineTo, &[p.x, p.y]),
            PathEl::QuadTo(p1, p2) => {
                PathCommand::absolute(CommandKind::QuadTo, &[p1.x, p1.y, p2.x, p2.y])
            }
            PathEl::CurveTo(p1, p2, p3) => PathCommand::absolute(
                CommandKind::CurveTo,
                &[p1.x, p1.y, p2.x, p2.y, p3.x, p3.y],
            ),
            PathEl::ClosePath => PathCommand::absolute(CommandKind::ClosePath, &[]),
        }))
    }

    /// None if nothing is drawn.
    pub fn bounding_box(&self) -> Option<Rect> {
        svgpathops::bounding_box(&self.to_bez_path()).map(Rect::from)
    }

    /// The painted area under `fill_rule`.
    pub fn area(&self, fill_rule: FillRule, tolerance: f64) -> f64 {
        svgpathops::area(&self.to_bez_path(), fill_rule, tolerance)
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(path_data: &str) -> Result<Self, Self::Err> {
        let commands = path_data::parse(path_data, true)?
            .into_iter()
            .filter_map(|raw| {
                CommandKind::from_letter(raw.letter)
                    .map(|(kind, relative)| PathCommand::new(kind, relative, &raw.args))
            })
            .collect();
        Ok(Path { commands })
    }
}
