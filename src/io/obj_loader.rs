use crate::core::geometry::{GeometryBuffer, Vertex};
use crate::error::AssetLoadError;
use log::info;
use nalgebra::{Point3, Vector2, Vector3};
use std::path::Path;

/// Triangle soup read from an OBJ file: one entry per face corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjData {
    pub positions: Vec<Point3<f32>>,
    pub uvs: Vec<Vector2<f32>>,
    pub normals: Vec<Vector3<f32>>,
}

impl ObjData {
    /// Interleaves the attribute streams with sequential indices.
    pub fn into_geometry(self) -> GeometryBuffer {
        let vertices = self
            .positions
            .into_iter()
            .zip(self.normals)
            .zip(self.uvs)
            .map(|((p, n), uv)| Vertex::new(p, n, uv))
            .collect();
        GeometryBuffer::sequential(vertices)
    }
}

/// Loads an OBJ file, triangulated and unrolled into flat attribute lists.
///
/// Every face corner must carry a position, a texture coordinate and a normal;
/// anything else is reported as [`AssetLoadError::AttributeCountMismatch`].
pub fn load_obj(path: impl AsRef<Path>) -> Result<ObjData, AssetLoadError> {
    let path = path.as_ref();
    info!("Loading OBJ file: {:?}", path);

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true, // Unifies indices for Position/Normal/UV
        ..Default::default()
    };

    let (models, _materials) =
        tobj::load_obj(path, &load_options).map_err(|source| AssetLoadError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

    let mut data = ObjData::default();

    for model in &models {
        let mesh = &model.mesh;
        for &index in &mesh.indices {
            let i = index as usize;
            if let Some(p) = mesh.positions.get(i * 3..i * 3 + 3) {
                data.positions.push(Point3::new(p[0], p[1], p[2]));
            }
            if let Some(t) = mesh.texcoords.get(i * 2..i * 2 + 2) {
                data.uvs.push(Vector2::new(t[0], t[1]));
            }
            if let Some(n) = mesh.normals.get(i * 3..i * 3 + 3) {
                data.normals.push(Vector3::new(n[0], n[1], n[2]));
            }
        }
    }

    let (positions, uvs, normals) = (data.positions.len(), data.uvs.len(), data.normals.len());
    if positions != uvs || positions != normals {
        return Err(AssetLoadError::AttributeCountMismatch {
            path: path.to_path_buf(),
            positions,
            uvs,
            normals,
        });
    }

    info!(
        "OBJ loaded successfully: {} objects, {} vertices",
        models.len(),
        positions
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("scenery-{}-{name}.obj", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    const TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn loads_complete_triangle() {
        let path = write_temp("tri", TRIANGLE);
        let data = load_obj(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.positions[1], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(data.normals[2], Vector3::new(0.0, 0.0, 1.0));

        let geometry = data.into_geometry();
        assert_eq!(geometry.indices, vec![0, 1, 2]);
    }

    #[test]
    fn missing_normals_is_a_count_mismatch() {
        let path = write_temp("nonormals", "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n");
        let err = load_obj(&path).unwrap_err();
        fs::remove_file(&path).ok();

        match err {
            AssetLoadError::AttributeCountMismatch {
                positions, normals, ..
            } => {
                assert_eq!(positions, 3);
                assert_eq!(normals, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(load_obj("no/such/model.obj").is_err());
    }
}
