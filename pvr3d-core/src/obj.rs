/// Parser for the OBJ subset used by model assets
///
/// Recognised records: `v x y z`, `vt u v` and `f a/at/an b/bt/bn c/ct/cn`
/// with 1-based indices. Normal indices are optional and ignored. Every
/// other line is skipped.
use nom::{
    bytes::complete::tag,
    character::complete::{char, space1, u32 as index},
    combinator::opt,
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};
use thiserror::Error;

use crate::geometry::{Face, Mesh, Vertex};
use crate::math::Vec3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjError {
    #[error("line {line}: malformed {record} record")]
    Malformed { line: usize, record: RecordKind },

    #[error("line {line}: {record} index {index} is out of range (1..={count})")]
    IndexOutOfRange {
        line: usize,
        record: RecordKind,
        index: u32,
        count: usize,
    },

    #[error("failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Position,
    TexCoord,
    Face,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Position => f.write_str("vertex position"),
            RecordKind::TexCoord => f.write_str("texture coordinate"),
            RecordKind::Face => f.write_str("face"),
        }
    }
}

/// One `position/uv[/normal]` reference of a face, still 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceIndex {
    pub position: u32,
    pub uv: u32,
    pub normal: Option<u32>,
}

/// Counts gathered by the first pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjCounts {
    pub positions: usize,
    pub uvs: usize,
    pub faces: usize,
}

/// Classify a line by its leading token.
pub fn classify(line: &str) -> Option<RecordKind> {
    let line = line.trim_start();
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some('v'), Some(c)) if c.is_whitespace() => Some(RecordKind::Position),
        (Some('v'), Some('t')) => Some(RecordKind::TexCoord),
        (Some('f'), _) => Some(RecordKind::Face),
        _ => None,
    }
}

fn position(input: &str) -> IResult<&str, Vec3> {
    let (input, _) = tag("v")(input)?;
    let (input, (x, y, z)) = tuple((
        preceded(space1, float),
        preceded(space1, float),
        preceded(space1, float),
    ))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

fn tex_coord(input: &str) -> IResult<&str, (f32, f32)> {
    let (input, _) = tag("vt")(input)?;
    tuple((preceded(space1, float), preceded(space1, float)))(input)
}

fn face_index(input: &str) -> IResult<&str, FaceIndex> {
    let (input, (position, uv, normal)) = tuple((
        index,
        preceded(char('/'), index),
        opt(preceded(char('/'), index)),
    ))(input)?;
    Ok((input, FaceIndex { position, uv, normal }))
}

fn face(input: &str) -> IResult<&str, [FaceIndex; 3]> {
    let (input, _) = tag("f")(input)?;
    let (input, (a, b, c)) = tuple((
        preceded(space1, face_index),
        preceded(space1, face_index),
        preceded(space1, face_index),
    ))(input)?;
    Ok((input, [a, b, c]))
}

fn records(source: &str) -> impl Iterator<Item = (usize, RecordKind, &str)> {
    source.lines().enumerate().filter_map(|(i, line)| {
        let line = line.trim_start();
        classify(line).map(|kind| (i + 1, kind, line))
    })
}

fn reserve<T>(what: &'static str, count: usize) -> Result<Vec<T>, ObjError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(count)
        .map_err(|_| ObjError::Allocation {
            what,
            bytes: count.saturating_mul(std::mem::size_of::<T>()),
        })?;
    Ok(buffer)
}

/// First pass: count records to size the working buffers.
pub fn count_records(source: &str) -> ObjCounts {
    let mut counts = ObjCounts::default();
    for (_, kind, _) in records(source) {
        match kind {
            RecordKind::Position => counts.positions += 1,
            RecordKind::TexCoord => counts.uvs += 1,
            RecordKind::Face => counts.faces += 1,
        }
    }
    counts
}

fn resolve<T: Copy>(
    items: &[T],
    index: u32,
    line: usize,
    record: RecordKind,
) -> Result<T, ObjError> {
    (index as usize)
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .copied()
        .ok_or(ObjError::IndexOutOfRange {
            line,
            record,
            index,
            count: items.len(),
        })
}

/// Parse a mesh in three passes: count, collect positions and UVs, then
/// resolve faces against them. Faces may reference positions declared later
/// in the file.
pub fn parse_obj(source: &str) -> Result<Mesh, ObjError> {
    let counts = count_records(source);

    let mut positions: Vec<Vec3> = reserve("model vertices", counts.positions)?;
    let mut uvs: Vec<(f32, f32)> = reserve("model UVs", counts.uvs)?;
    let mut faces: Vec<Face> = reserve("model faces", counts.faces)?;

    for (line, kind, text) in records(source) {
        let malformed = || ObjError::Malformed { line, record: kind };
        match kind {
            RecordKind::Position => {
                let (_, p) = position(text).map_err(|_| malformed())?;
                positions.push(p);
            }
            RecordKind::TexCoord => {
                let (_, uv) = tex_coord(text).map_err(|_| malformed())?;
                uvs.push(uv);
            }
            RecordKind::Face => {}
        }
    }

    for (line, kind, text) in records(source) {
        if kind != RecordKind::Face {
            continue;
        }
        let (_, refs) = face(text).map_err(|_| ObjError::Malformed { line, record: kind })?;

        let mut vertices = [Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0); 3];
        for (vertex, r) in vertices.iter_mut().zip(refs.iter()) {
            let p = resolve(&positions, r.position, line, RecordKind::Position)?;
            let (u, v) = resolve(&uvs, r.uv, line, RecordKind::TexCoord)?;
            *vertex = Vertex::new(p.x, p.y, p.z, u, v);
        }
        faces.push(Face::new(vertices[0], vertices[1], vertices[2]));
    }

    Ok(Mesh { faces })
}
