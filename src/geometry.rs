// Procedural geometry for the tutorial scenes

use std::collections::HashSet;
use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Vec2, Vec3};

use crate::camera::Camera;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

// Vertex layout shared by every mesh
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Index range drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub start: u32,
    pub count: u32,
    pub material_index: usize,
}

/// Indexed vertex data. Immutable once built; shared between nodes.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: u64,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    topology: Topology,
    groups: Vec<Group>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Self {
        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            vertices,
            indices,
            topology,
            groups: Vec::new(),
        }
    }

    fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    /// Non-indexed triangle list, e.g. a hand-written vertex table.
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self::new(vertices, indices, Topology::Triangles)
    }

    /// Unique id, stable for the lifetime of the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Lines => 0,
        }
    }

    /// Box centred on the origin, subdivided per axis.
    ///
    /// Faces are emitted in +X, -X, +Y, -Y, +Z, -Z order, each in its own
    /// group so a material can be assigned per face.
    pub fn cuboid(width: f32, height: f32, depth: f32, width_segments: u32, height_segments: u32, depth_segments: u32) -> Self {
        let mut builder = BoxBuilder::default();
        let (ws, hs, ds) = (width_segments.max(1), height_segments.max(1), depth_segments.max(1));

        builder.plane([2, 1, 0], -1.0, -1.0, depth, height, width, ds, hs, 0);
        builder.plane([2, 1, 0], 1.0, -1.0, depth, height, -width, ds, hs, 1);
        builder.plane([0, 2, 1], 1.0, 1.0, width, depth, height, ws, ds, 2);
        builder.plane([0, 2, 1], 1.0, -1.0, width, depth, -height, ws, ds, 3);
        builder.plane([0, 1, 2], 1.0, -1.0, width, height, depth, ws, hs, 4);
        builder.plane([0, 1, 2], -1.0, -1.0, width, height, -depth, ws, hs, 5);

        Self::new(builder.vertices, builder.indices, Topology::Triangles).with_groups(builder.groups)
    }

    /// Unit-segment box.
    pub fn cube(size: f32) -> Self {
        Self::cuboid(size, size, size, 1, 1, 1)
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::sphere_section(radius, width_segments, height_segments, 0.0, TAU, 0.0, PI)
    }

    /// Sphere limited to a horizontal (`phi`) and vertical (`theta`) sweep.
    pub fn sphere_section(
        radius: f32,
        width_segments: u32,
        height_segments: u32,
        phi_start: f32,
        phi_length: f32,
        theta_start: f32,
        theta_length: f32,
    ) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let theta_end = (theta_start + theta_length).min(PI);

        let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
        let mut grid: Vec<Vec<u32>> = Vec::with_capacity(hs as usize + 1);

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            // Pole rows get a half-segment uv shift so texels are centred.
            let u_offset = if iy == 0 && theta_start == 0.0 {
                0.5 / ws as f32
            } else if iy == hs && theta_end == PI {
                -0.5 / ws as f32
            } else {
                0.0
            };

            let mut row = Vec::with_capacity(ws as usize + 1);
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let phi = phi_start + u * phi_length;
                let theta = theta_start + v * theta_length;
                let position = Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                row.push(vertices.len() as u32);
                vertices.push(Vertex::new(
                    position,
                    position.normalize_or_zero(),
                    Vec2::new(u + u_offset, 1.0 - v),
                ));
            }
            grid.push(row);
        }

        let mut indices = Vec::new();
        for iy in 0..hs as usize {
            for ix in 0..ws as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 || theta_start > 0.0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs as usize - 1 || theta_end < PI {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self::new(vertices, indices, Topology::Triangles)
    }

    /// Plane in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let mut vertices = Vec::with_capacity(4);
        for iy in 0..=1u32 {
            let y = iy as f32 * height - height * 0.5;
            for ix in 0..=1u32 {
                let x = ix as f32 * width - width * 0.5;
                vertices.push(Vertex::new(
                    Vec3::new(x, -y, 0.0),
                    Vec3::Z,
                    Vec2::new(ix as f32, 1.0 - iy as f32),
                ));
            }
        }
        // a b d, b c d over the 2x2 grid
        Self::new(vertices, vec![0, 2, 1, 2, 3, 1], Topology::Triangles)
    }

    /// Flat disc in the XY plane facing +Z.
    pub fn circle(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut vertices = vec![Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::splat(0.5))];

        for s in 0..=segments {
            let angle = s as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            vertices.push(Vertex::new(
                Vec3::new(radius * cos, radius * sin, 0.0),
                Vec3::Z,
                Vec2::new((cos + 1.0) * 0.5, (sin + 1.0) * 0.5),
            ));
        }

        let indices = (1..=segments).flat_map(|i| [i, i + 1, 0]).collect();
        Self::new(vertices, indices, Topology::Triangles)
    }

    /// Capped cylinder along Y; either radius may be zero (cone).
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let rs = radial_segments.max(3);
        let half_height = height * 0.5;
        let slope = (radius_bottom - radius_top) / height;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Torso, one height segment.
        let mut rows: Vec<Vec<u32>> = Vec::with_capacity(2);
        for y in 0..=1u32 {
            let v = y as f32;
            let radius = v * (radius_bottom - radius_top) + radius_top;
            let mut row = Vec::with_capacity(rs as usize + 1);
            for x in 0..=rs {
                let u = x as f32 / rs as f32;
                let (sin, cos) = (u * TAU).sin_cos();
                row.push(vertices.len() as u32);
                vertices.push(Vertex::new(
                    Vec3::new(radius * sin, -v * height + half_height, radius * cos),
                    Vec3::new(sin, slope, cos).normalize(),
                    Vec2::new(u, 1.0 - v),
                ));
            }
            rows.push(row);
        }
        for x in 0..rs as usize {
            let a = rows[0][x];
            let b = rows[1][x];
            let c = rows[1][x + 1];
            let d = rows[0][x + 1];
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        for (top, radius) in [(true, radius_top), (false, radius_bottom)] {
            if radius <= 0.0 {
                continue;
            }
            let sign = if top { 1.0 } else { -1.0 };
            let normal = Vec3::new(0.0, sign, 0.0);

            let center_start = vertices.len() as u32;
            for _ in 1..=rs {
                vertices.push(Vertex::new(Vec3::new(0.0, half_height * sign, 0.0), normal, Vec2::splat(0.5)));
            }
            let rim_start = vertices.len() as u32;
            for x in 0..=rs {
                let u = x as f32 / rs as f32;
                let (sin, cos) = (u * TAU).sin_cos();
                vertices.push(Vertex::new(
                    Vec3::new(radius * sin, half_height * sign, radius * cos),
                    normal,
                    Vec2::new(cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5),
                ));
            }
            for x in 0..rs {
                let c = center_start + x;
                let i = rim_start + x;
                if top {
                    indices.extend_from_slice(&[i, i + 1, c]);
                } else {
                    indices.extend_from_slice(&[i + 1, i, c]);
                }
            }
        }

        Self::new(vertices, indices, Topology::Triangles)
    }

    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::cylinder(0.0, radius, height, radial_segments)
    }

    /// Regular dodecahedron with flat-shaded faces.
    pub fn dodecahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let r = 1.0 / t;

        #[rustfmt::skip]
        let corners: [[f32; 3]; 20] = [
            [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
            [0.0, -r, -t], [0.0, -r, t], [0.0, r, -t], [0.0, r, t],
            [-r, -t, 0.0], [-r, t, 0.0], [r, -t, 0.0], [r, t, 0.0],
            [-t, 0.0, -r], [t, 0.0, -r], [-t, 0.0, r], [t, 0.0, r],
        ];

        #[rustfmt::skip]
        const FACES: [[usize; 3]; 36] = [
            [3, 11, 7], [3, 7, 15], [3, 15, 13],
            [7, 19, 17], [7, 17, 6], [7, 6, 15],
            [17, 4, 8], [17, 8, 10], [17, 10, 6],
            [8, 0, 16], [8, 16, 2], [8, 2, 10],
            [0, 12, 1], [0, 1, 18], [0, 18, 16],
            [6, 10, 2], [6, 2, 13], [6, 13, 15],
            [2, 16, 18], [2, 18, 3], [2, 3, 13],
            [18, 1, 9], [18, 9, 11], [18, 11, 3],
            [4, 14, 12], [4, 12, 0], [4, 0, 8],
            [11, 9, 5], [11, 5, 19], [11, 19, 7],
            [19, 5, 14], [19, 14, 4], [19, 4, 17],
            [1, 12, 14], [1, 14, 5], [1, 5, 9],
        ];

        let point = |i: usize| Vec3::from(corners[i]).normalize() * radius;
        let mut vertices = Vec::with_capacity(FACES.len() * 3);

        for face in FACES {
            let (mut a, mut b, c) = (point(face[0]), point(face[1]), point(face[2]));
            let mut normal = (b - a).cross(c - a).normalize_or_zero();
            // Keep every triangle wound counter-clockwise seen from outside.
            if normal.dot(a + b + c) < 0.0 {
                std::mem::swap(&mut a, &mut b);
                normal = -normal;
            }
            for p in [a, b, c] {
                let n = p.normalize_or_zero();
                let u = 0.5 + n.z.atan2(-n.x) / TAU;
                let v = 0.5 + n.y.asin() / PI;
                vertices.push(Vertex::new(p, normal, Vec2::new(u, v)));
            }
        }

        Self::from_vertices(vertices)
    }

    /// Connected line through `points`.
    pub fn line_strip(points: &[Vec3]) -> Self {
        let vertices = points
            .iter()
            .map(|p| Vertex::new(*p, Vec3::Z, Vec2::ZERO))
            .collect();
        let indices = (1..points.len() as u32).flat_map(|i| [i - 1, i]).collect();
        Self::new(vertices, indices, Topology::Lines)
    }

    /// Independent segments, one per pair of points.
    pub fn line_segments(segments: &[(Vec3, Vec3)]) -> Self {
        let vertices = segments
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .map(|p| Vertex::new(p, Vec3::Z, Vec2::ZERO))
            .collect();
        let indices = (0..segments.len() as u32 * 2).collect();
        Self::new(vertices, indices, Topology::Lines)
    }

    /// Unique triangle edges as a line geometry.
    pub fn wireframe(&self) -> Self {
        if self.topology == Topology::Lines {
            return Self::new(self.vertices.clone(), self.indices.clone(), Topology::Lines);
        }

        let mut seen = HashSet::new();
        let mut indices = Vec::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    indices.extend_from_slice(&[key.0, key.1]);
                }
            }
        }
        Self::new(self.vertices.clone(), indices, Topology::Lines)
    }

    /// Scales positions and re-derives normals. A negative factor mirrors the
    /// geometry, which turns its faces inside out.
    pub fn scaled(&self, factor: Vec3) -> Self {
        let inverse = Vec3::ONE / factor;
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex {
                position: (v.position() * factor).into(),
                normal: (v.normal() * inverse).normalize_or_zero().into(),
                uv: v.uv,
            })
            .collect();
        Self::new(vertices, self.indices.clone(), self.topology).with_groups(self.groups.clone())
    }

    /// Outline of a perspective frustum with aspect 1, in camera space.
    ///
    /// Scale the holding node's x axis by the camera aspect to match it.
    pub fn frustum_lines(camera: &Camera) -> Self {
        let half = (camera.fov_y.to_radians() * 0.5).tan();
        let corners = |d: f32| {
            let h = half * d;
            [
                Vec3::new(-h, -h, -d),
                Vec3::new(h, -h, -d),
                Vec3::new(h, h, -d),
                Vec3::new(-h, h, -d),
            ]
        };
        let near = corners(camera.near);
        let far = corners(camera.far);

        let mut segments = Vec::with_capacity(16);
        for i in 0..4 {
            let j = (i + 1) % 4;
            segments.push((near[i], near[j]));
            segments.push((far[i], far[j]));
            segments.push((near[i], far[i]));
            segments.push((Vec3::ZERO, near[i]));
        }
        Self::line_segments(&segments)
    }
}

#[derive(Default)]
struct BoxBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    groups: Vec<Group>,
}

impl BoxBuilder {
    // `axes` maps (u, v, w) onto x/y/z components.
    #[allow(clippy::too_many_arguments)]
    fn plane(
        &mut self,
        axes: [usize; 3],
        u_dir: f32,
        v_dir: f32,
        width: f32,
        height: f32,
        depth: f32,
        grid_x: u32,
        grid_y: u32,
        material_index: usize,
    ) {
        let [u, v, w] = axes;
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;
        let depth_half = depth * 0.5;
        let facing = if depth > 0.0 { 1.0 } else { -1.0 };

        let first_vertex = self.vertices.len() as u32;
        let group_start = self.indices.len() as u32;

        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height * 0.5;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width * 0.5;

                let mut position = [0.0; 3];
                position[u] = x * u_dir;
                position[v] = y * v_dir;
                position[w] = depth_half;

                let mut normal = [0.0; 3];
                normal[w] = facing;

                self.vertices.push(Vertex {
                    position,
                    normal,
                    uv: [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                });
            }
        }

        let row = grid_x + 1;
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = first_vertex + ix + row * iy;
                let b = first_vertex + ix + row * (iy + 1);
                let c = first_vertex + ix + 1 + row * (iy + 1);
                let d = first_vertex + ix + 1 + row * iy;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        self.groups.push(Group {
            start: group_start,
            count: self.indices.len() as u32 - group_start,
            material_index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn face_normal(g: &Geometry, tri: usize) -> Vec3 {
        let i = &g.indices()[tri * 3..tri * 3 + 3];
        let p = |k: usize| g.vertices()[i[k] as usize].position();
        (p(1) - p(0)).cross(p(2) - p(0)).normalize()
    }

    #[test]
    fn cuboid_has_six_groups_and_outward_faces() {
        let g = Geometry::cuboid(1.0, 1.0, 1.0, 2, 2, 2);
        assert_eq!(g.groups().len(), 6);
        // 6 faces * 2x2 cells * 2 triangles
        assert_eq!(g.triangle_count(), 48);
        assert_eq!(g.vertices().len(), 6 * 9);

        for group in g.groups() {
            let tri = group.start as usize / 3;
            let winding = face_normal(&g, tri);
            let stored = g.vertices()[g.indices()[group.start as usize] as usize].normal();
            assert_abs_diff_eq!(winding.dot(stored), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn sphere_vertex_grid() {
        let g = Geometry::sphere(1.0, 8, 8);
        assert_eq!(g.vertices().len(), 9 * 9);
        // Pole rows contribute one triangle per cell.
        assert_eq!(g.triangle_count(), 8 * 8 * 2 - 2 * 8);
        for v in g.vertices() {
            assert_abs_diff_eq!(v.position().length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn half_dome_stays_above_equator() {
        let g = Geometry::sphere_section(2.0, 12, 12, 0.0, TAU, 0.0, PI * 0.5);
        assert!(g.vertices().iter().all(|v| v.position[1] >= -1e-5));
    }

    #[test]
    fn cone_has_no_top_cap() {
        let cylinder = Geometry::cylinder(1.0, 1.0, 1.0, 6);
        let cone = Geometry::cone(1.0, 1.0, 6);
        assert_eq!(cylinder.triangle_count(), 6 * 2 + 6 * 2);
        assert_eq!(cone.triangle_count(), 6 * 2 + 6);
    }

    #[test]
    fn dodecahedron_faces_point_outward() {
        let g = Geometry::dodecahedron(1.0);
        assert_eq!(g.triangle_count(), 36);
        for tri in 0..g.triangle_count() {
            let center = (0..3)
                .map(|k| g.vertices()[tri * 3 + k].position())
                .fold(Vec3::ZERO, |acc, p| acc + p);
            assert!(face_normal(&g, tri).dot(center) > 0.0);
        }
    }

    #[test]
    fn wireframe_deduplicates_shared_edges() {
        let quad = Geometry::plane(1.0, 1.0);
        let wire = quad.wireframe();
        assert_eq!(wire.topology(), Topology::Lines);
        // 4 border edges + 1 diagonal
        assert_eq!(wire.indices().len(), 5 * 2);
    }

    #[test]
    fn mirrored_scale_flips_normals() {
        let g = Geometry::plane(1.0, 1.0).scaled(Vec3::new(-1.0, 1.0, 1.0));
        assert_abs_diff_eq!(g.vertices()[0].position[0], 0.5, epsilon = 1e-6);

        let sphere = Geometry::sphere(1.0, 8, 6).scaled(Vec3::new(-1.0, 1.0, 1.0));
        let v = sphere.vertices()[20];
        // Normal still points away from the centre; the winding now faces in.
        assert!(v.normal().dot(v.position()) > 0.0);
        assert_ne!(g.id(), Geometry::plane(1.0, 1.0).id());
    }

    #[test]
    fn line_strip_links_consecutive_points() {
        let g = Geometry::line_strip(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(g.indices(), &[0, 1, 1, 2]);
    }

    #[test]
    fn plane_faces_plus_z() {
        let g = Geometry::plane(2.0, 2.0);
        assert_abs_diff_eq!(face_normal(&g, 0).z, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(face_normal(&g, 1).z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn circle_fan() {
        let g = Geometry::circle(1.0, 24);
        assert_eq!(g.triangle_count(), 24);
        assert_abs_diff_eq!(face_normal(&g, 0).z, 1.0, epsilon = 1e-6);
    }
}
