// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ export.
//!
//! One `o`/`g` group per mesh, one `usemtl` run per material slot. Meshes
//! are built Z-up; OBJ consumers expect Y-up, so positions are written as
//! `(x, z, -y)`. That is a proper rotation, so winding is unchanged.

use crate::error::Result;
use citymesh_geometry::MeshBuffer;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub fn write_obj<W: Write>(mut writer: W, meshes: &[MeshBuffer]) -> io::Result<()> {
    writeln!(writer, "# citymesh {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "# meshes: {}", meshes.len())?;

    // OBJ indices are 1-based and global across the file
    let mut base: usize = 1;
    for (i, mesh) in meshes.iter().enumerate() {
        if mesh.is_empty() {
            continue;
        }
        let name = format!("{}_{}", mesh.class, i);
        writeln!(writer, "o {}", name)?;
        writeln!(writer, "g {}", name)?;

        for p in mesh.positions.chunks_exact(3) {
            writeln!(writer, "v {} {} {}", p[0], p[2], -p[1])?;
        }
        for uv in mesh.uvs.chunks_exact(2) {
            writeln!(writer, "vt {} {}", uv[0], uv[1])?;
        }

        for sub in &mesh.submeshes {
            if sub.indices.is_empty() {
                continue;
            }
            writeln!(writer, "usemtl {}", sub.slot)?;
            for tri in sub.indices.chunks_exact(3) {
                let (a, b, c) = (
                    base + tri[0] as usize,
                    base + tri[1] as usize,
                    base + tri[2] as usize,
                );
                writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
            }
        }

        base += mesh.vertex_count();
    }

    writer.flush()
}

/// Write `meshes` to a new file at `path`
pub fn write_obj_file(path: &Path, meshes: &[MeshBuffer]) -> Result<()> {
    let file = File::create(path)?;
    write_obj(BufWriter::new(file), meshes)?;
    tracing::info!(path = %path.display(), meshes = meshes.len(), "Wrote OBJ");
    Ok(())
}
