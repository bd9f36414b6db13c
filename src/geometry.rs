//! Procedural geometry for the preview's primitives.
//!
//! Everything here is CPU-side: a [`RawGeometry`] is plain vertex and index
//! data that a [`RenderBackend`](crate::RenderBackend) uploads when a stage is
//! built. Generators follow one winding convention: counter-clockwise when
//! seen from outside the solid, so back-face culling keeps the visible side.
//!
//! | Generator | Shape | Used by |
//! |-----------|-------|---------|
//! | [`RawGeometry::lump`] | jittered, subdivided dodecahedron | raw lump |
//! | [`RawGeometry::cylinder`] | capped cylinder along Y | heated rod |
//! | [`RawGeometry::torus`] | torus in the XY plane | rings |
//! | [`RawGeometry::sphere`] | UV sphere | inlaid stones |

use crate::mesh::Vertex3d;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Vertex and index data before upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    /// Creates raw geometry from vertices and indices.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize].position(),
                self.vertices[tri[1] as usize].position(),
                self.vertices[tri[2] as usize].position(),
            ]
        })
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = v.position();
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center point of the geometry.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// An irregular, faceted solid: a dodecahedron subdivided `detail` times
    /// and projected onto a sphere of `radius`, then squashed vertically.
    ///
    /// Every vertex height becomes `y * squash + r` with `r` drawn uniformly
    /// from `[-jitter, jitter]`. Corners shared by several faces receive the
    /// same displacement, so the surface stays closed. Normals are per face.
    pub fn lump<R: Rng>(
        radius: f32,
        detail: u32,
        squash: f32,
        jitter: f32,
        rng: &mut R,
    ) -> Self {
        let corners = dodecahedron_corners();
        let mut triangles = Vec::with_capacity(DODECAHEDRON_FACES.len() * 4);

        for face in DODECAHEDRON_FACES {
            let [a, b, c] = face.map(|i| corners[i]);
            subdivide(a, b, c, detail, &mut triangles);
        }

        // Weld by position so shared corners jitter together.
        let mut welded: Vec<(Vec3, f32)> = Vec::new();
        let mut displace = |p: Vec3| -> Vec3 {
            let p = p.normalize() * radius;
            let dy = match welded.iter().find(|(q, _)| q.distance_squared(p) < 1.0e-8) {
                Some(&(_, dy)) => dy,
                None => {
                    let dy = if jitter > 0.0 {
                        rng.gen_range(-jitter..=jitter)
                    } else {
                        0.0
                    };
                    welded.push((p, dy));
                    dy
                }
            };
            Vec3::new(p.x, p.y * squash + dy, p.z)
        };

        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        for [a, b, c] in triangles {
            // Orient outward on the undistorted sphere; the squash keeps it.
            let outward = (b - a).cross(c - a).dot(a + b + c) >= 0.0;
            let (b, c) = if outward { (b, c) } else { (c, b) };

            let [a, b, c] = [a, b, c].map(&mut displace);
            let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
            for p in [a, b, c] {
                vertices.push(Vertex3d::new(p.to_array(), normal, spherical_uv(p)));
            }
        }

        let indices = (0..vertices.len() as u32).collect();
        Self::new(vertices, indices)
    }

    /// A capped cylinder centered at the origin with its axis along +Y.
    pub fn cylinder(radius: f32, height: f32, radial_segments: u32) -> Self {
        let segments = radial_segments.max(3);
        let half = height * 0.5;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side: u runs around the axis, v runs bottom to top.
        for row in 0..=1 {
            let y = if row == 0 { -half } else { half };
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let (sin, cos) = (u * TAU).sin_cos();
                vertices.push(Vertex3d::new(
                    [radius * sin, y, radius * cos],
                    [sin, 0.0, cos],
                    [u, 1.0 - row as f32],
                ));
            }
        }
        grid_indices(0, segments, 1, &mut indices);

        for top in [true, false] {
            let y = if top { half } else { -half };
            let normal = [0.0, if top { 1.0 } else { -1.0 }, 0.0];
            let center = vertices.len() as u32;
            vertices.push(Vertex3d::new([0.0, y, 0.0], normal, [0.5, 0.5]));

            for seg in 0..=segments {
                let (sin, cos) = (seg as f32 / segments as f32 * TAU).sin_cos();
                vertices.push(Vertex3d::new(
                    [radius * sin, y, radius * cos],
                    normal,
                    [0.5 + sin * 0.5, 0.5 + cos * 0.5],
                ));
            }

            for seg in 0..segments {
                let ring = center + 1 + seg;
                if top {
                    indices.extend_from_slice(&[center, ring, ring + 1]);
                } else {
                    indices.extend_from_slice(&[center, ring + 1, ring]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    /// A torus centered at the origin lying in the XY plane.
    ///
    /// * `major_radius` - distance from the center to the middle of the tube
    /// * `tube_radius` - radius of the tube itself
    /// * `radial_segments` - divisions around the tube
    /// * `tubular_segments` - divisions around the ring
    pub fn torus(
        major_radius: f32,
        tube_radius: f32,
        radial_segments: u32,
        tubular_segments: u32,
    ) -> Self {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);
        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
        let mut indices = Vec::new();

        for j in 0..=radial {
            let v = j as f32 / radial as f32;
            let (sin_v, cos_v) = (v * TAU).sin_cos();

            for i in 0..=tubular {
                let u = i as f32 / tubular as f32;
                let (sin_u, cos_u) = (u * TAU).sin_cos();

                let ring = major_radius + tube_radius * cos_v;
                let position = [ring * cos_u, ring * sin_u, tube_radius * sin_v];
                let normal = [cos_v * cos_u, cos_v * sin_u, sin_v];
                vertices.push(Vertex3d::new(position, normal, [u, v]));
            }
        }
        grid_indices(0, tubular, radial, &mut indices);

        Self::new(vertices, indices)
    }

    /// A UV sphere of `radius` centered at the origin.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let segments = width_segments.max(3);
        let rings = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let (sin_phi, cos_phi) = (v * PI).sin_cos();

            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let (sin_theta, cos_theta) = (u * TAU).sin_cos();

                let normal = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
                let position = normal.map(|n| n * radius);
                vertices.push(Vertex3d::new(position, normal, [u, v]));
            }
        }
        grid_indices(0, segments, rings, &mut indices);

        Self::new(vertices, indices)
    }
}

/// Two triangles per cell of a `(cols + 1) x (rows + 1)` vertex grid.
///
/// The winding faces the side where `d/du x d/dv` points.
fn grid_indices(base: u32, cols: u32, rows: u32, indices: &mut Vec<u32>) {
    let stride = cols + 1;
    for row in 0..rows {
        for col in 0..cols {
            let p00 = base + row * stride + col;
            let p10 = p00 + 1;
            let p01 = p00 + stride;
            let p11 = p01 + 1;

            indices.extend_from_slice(&[p00, p10, p01]);
            indices.extend_from_slice(&[p10, p11, p01]);
        }
    }
}

/// Splits a triangle into `(detail + 1)^2` smaller ones.
fn subdivide(a: Vec3, b: Vec3, c: Vec3, detail: u32, out: &mut Vec<[Vec3; 3]>) {
    let cols = detail + 1;
    let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols as usize + 1);

    for i in 0..=cols {
        let t = i as f32 / cols as f32;
        let aj = a.lerp(c, t);
        let bj = b.lerp(c, t);
        let rows = cols - i;

        let row = (0..=rows)
            .map(|j| {
                if rows == 0 {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / rows as f32)
                }
            })
            .collect();
        grid.push(row);
    }

    for i in 0..cols as usize {
        for j in 0..(2 * (cols as usize - i) - 1) {
            let k = j / 2;
            if j % 2 == 0 {
                out.push([grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
            } else {
                out.push([grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
            }
        }
    }
}

fn spherical_uv(p: Vec3) -> [f32; 2] {
    let dir = p.normalize_or_zero();
    let u = dir.z.atan2(dir.x) / TAU + 0.5;
    let v = dir.y.clamp(-1.0, 1.0).asin() / PI + 0.5;
    [u, v]
}

fn dodecahedron_corners() -> [Vec3; 20] {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let r = 1.0 / t;
    [
        // (±1, ±1, ±1)
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, 1.0),
        // (0, ±1/φ, ±φ)
        Vec3::new(0.0, -r, -t),
        Vec3::new(0.0, -r, t),
        Vec3::new(0.0, r, -t),
        Vec3::new(0.0, r, t),
        // (±1/φ, ±φ, 0)
        Vec3::new(-r, -t, 0.0),
        Vec3::new(-r, t, 0.0),
        Vec3::new(r, -t, 0.0),
        Vec3::new(r, t, 0.0),
        // (±φ, 0, ±1/φ)
        Vec3::new(-t, 0.0, -r),
        Vec3::new(t, 0.0, -r),
        Vec3::new(-t, 0.0, r),
        Vec3::new(t, 0.0, r),
    ]
}

/// Twelve pentagons, three triangles each.
#[rustfmt::skip]
const DODECAHEDRON_FACES: [[usize; 3]; 36] = [
    [3, 11, 7],   [3, 7, 15],   [3, 15, 13],
    [7, 19, 17],  [7, 17, 6],   [7, 6, 15],
    [17, 4, 8],   [17, 8, 10],  [17, 10, 6],
    [8, 0, 16],   [8, 16, 2],   [8, 2, 10],
    [0, 12, 1],   [0, 1, 18],   [0, 18, 16],
    [6, 10, 2],   [6, 2, 13],   [6, 13, 15],
    [2, 16, 18],  [2, 18, 3],   [2, 3, 13],
    [18, 1, 9],   [18, 9, 11],  [18, 11, 3],
    [4, 14, 12],  [4, 12, 0],   [4, 0, 8],
    [11, 9, 5],   [11, 5, 19],  [11, 19, 7],
    [19, 5, 14],  [19, 14, 4],  [19, 4, 17],
    [1, 12, 14],  [1, 14, 5],   [1, 5, 9],
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
        (b - a).cross(c - a)
    }

    /// Every non-degenerate triangle of a solid centered at the origin faces away from it.
    fn assert_outward_from_origin(geom: &RawGeometry) {
        for tri in geom.triangles() {
            let n = face_normal(tri);
            if n.length() < 1e-6 {
                continue;
            }
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward triangle {:?}", tri);
        }
    }

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(geom.center(), Vec3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn lump_without_jitter_is_a_squashed_sphere() {
        let mut rng = StdRng::seed_from_u64(7);
        let lump = RawGeometry::lump(1.2, 1, 0.8, 0.0, &mut rng);

        assert_eq!(lump.triangle_count(), 36 * 4);
        for v in &lump.vertices {
            let p = v.position();
            let unsquashed = Vec3::new(p.x, p.y / 0.8, p.z);
            assert!((unsquashed.length() - 1.2).abs() < 1e-4);
        }
        assert_outward_from_origin(&lump);
    }

    #[test]
    fn lump_jitter_stays_in_range_and_keeps_corners_welded() {
        let mut rng = StdRng::seed_from_u64(42);
        let lump = RawGeometry::lump(1.2, 1, 0.8, 0.1, &mut rng);

        let (min, max) = lump.bounds();
        assert!(max.y <= 1.2 * 0.8 + 0.1 + 1e-4);
        assert!(min.y >= -1.2 * 0.8 - 0.1 - 1e-4);

        // Corners with the same XZ on the sphere must share a height.
        let mut heights: HashMap<[i32; 2], Vec<f32>> = HashMap::new();
        for v in &lump.vertices {
            let p = v.position();
            let key = [(p.x * 1.0e4).round() as i32, (p.z * 1.0e4).round() as i32];
            heights.entry(key).or_default().push(p.y);
        }
        assert!(heights.values().any(|ys| ys.len() > 1));
        for ys in heights.values_mut() {
            ys.sort_by(f32::total_cmp);
            ys.dedup_by(|a, b| (*a - *b).abs() < 1e-4);
            // Only a corner and its mirror below the equator can share XZ.
            assert!(ys.len() <= 2, "unwelded heights {:?}", ys);
        }
    }

    #[test]
    fn cylinder_faces_outward() {
        let rod = RawGeometry::cylinder(0.3, 3.0, 32);

        assert_eq!(rod.triangle_count(), 32 * 2 + 32 * 2);
        let (min, max) = rod.bounds();
        assert!((max.y - 1.5).abs() < 1e-5);
        assert!((min.y + 1.5).abs() < 1e-5);
        assert_outward_from_origin(&rod);
    }

    #[test]
    fn torus_lies_in_xy_plane_and_faces_outward() {
        let ring = RawGeometry::torus(1.5, 0.25, 32, 64);

        assert_eq!(ring.vertices.len(), 33 * 65);
        assert_eq!(ring.triangle_count(), 32 * 64 * 2);

        let (min, max) = ring.bounds();
        assert!((max.x - 1.75).abs() < 1e-4);
        assert!((max.y - 1.75).abs() < 1e-4);
        assert!((max.z - 0.25).abs() < 1e-4);
        assert!((min.z + 0.25).abs() < 1e-4);

        for tri in ring.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| ring.vertices[i as usize]);
            let n = face_normal([a.position(), b.position(), c.position()]);
            if n.length() < 1e-6 {
                continue;
            }
            assert!(n.dot(Vec3::from(a.normal)) > 0.0);
        }
    }

    #[test]
    fn sphere_has_requested_radius_and_faces_outward() {
        let stone = RawGeometry::sphere(0.1, 16, 16);

        assert_eq!(stone.vertices.len(), 17 * 17);
        for v in &stone.vertices {
            assert!((v.position().length() - 0.1).abs() < 1e-5);
        }
        assert_outward_from_origin(&stone);
    }
}
