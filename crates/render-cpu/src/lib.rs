//! Progressive CPU ray tracer behind the viewer's render-session contract.
//!
//! One session owns one model. Construction builds (and times) a per-mesh
//! BLAS and a TLAS over mesh bounds; each `render_one_pass` adds one
//! jittered sample per pixel to an accumulation buffer, so the image
//! refines for as long as the camera holds still.
//!
//! # Invariants
//! - Accumulation resets on every camera change and every resize.
//! - Rendering is deterministic: the per-pixel jitter comes from an integer
//!   hash of pixel and pass index, never from wall-clock state.

pub mod bvh;

use bvh::{intersect_triangle, Bvh, Ray};
use glam::Vec3;
use rayview_common::{pack_rgba8, CameraPose};
use rayview_scene::{Aabb, Model, TriMesh};
use rayview_session::RenderSession;
use std::time::{Duration, Instant};

/// Vertical field of view, matching the fixed-lens viewer this replaces.
const FOV_Y_DEGREES: f32 = 60.0;
/// Direction from any surface point toward the single directional light.
const LIGHT_DIR: Vec3 = Vec3::new(-0.4, 1.0, 0.6);
const AMBIENT: f32 = 0.2;

/// One mesh with its bottom-level acceleration structure.
struct MeshAccel {
    positions: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
    color: Vec3,
    bounds: Aabb,
    blas: Bvh,
}

impl MeshAccel {
    fn build(mesh: TriMesh) -> Self {
        let tri_bounds: Vec<Aabb> = mesh
            .indices
            .iter()
            .map(|tri| {
                let mut b = Aabb::empty();
                for &i in tri {
                    b.grow(mesh.positions[i as usize]);
                }
                b
            })
            .collect();
        let blas = Bvh::build(&tri_bounds);
        let mut bounds = Aabb::empty();
        for b in &tri_bounds {
            bounds.union(b);
        }
        Self {
            positions: mesh.positions,
            indices: mesh.indices,
            color: mesh.color,
            bounds,
            blas,
        }
    }

    fn vertices(&self, tri: u32) -> (Vec3, Vec3, Vec3) {
        let [a, b, c] = self.indices[tri as usize];
        (
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }

    fn intersect(&self, ray: &Ray) -> Option<(f32, u32)> {
        self.blas.intersect(ray, |tri, ray| {
            let (v0, v1, v2) = self.vertices(tri);
            intersect_triangle(ray, v0, v1, v2)
        })
    }
}

/// Progressive CPU render session over a two-level BVH.
pub struct CpuRenderSession {
    meshes: Vec<MeshAccel>,
    tlas: Bvh,
    blas_time: Duration,
    tlas_time: Duration,
    pose: CameraPose,
    width: u32,
    height: u32,
    /// Linear radiance sums; divided by `passes` at download time.
    accum: Vec<Vec3>,
    passes: u32,
}

impl CpuRenderSession {
    /// Consume a model, building and timing both acceleration levels.
    pub fn new(model: Model) -> Self {
        let mut blas_time = Duration::ZERO;
        let meshes: Vec<MeshAccel> = model
            .meshes
            .into_iter()
            .map(|mesh| {
                let start = Instant::now();
                let accel = MeshAccel::build(mesh);
                blas_time += start.elapsed();
                accel
            })
            .collect();

        let start = Instant::now();
        let mesh_bounds: Vec<Aabb> = meshes.iter().map(|m| m.bounds).collect();
        let tlas = Bvh::build(&mesh_bounds);
        let tlas_time = start.elapsed();

        tracing::info!(
            "built acceleration structures: {} meshes, blas {}us, tlas {}us",
            meshes.len(),
            blas_time.as_micros(),
            tlas_time.as_micros()
        );

        Self {
            meshes,
            tlas,
            blas_time,
            tlas_time,
            pose: CameraPose::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y),
            width: 0,
            height: 0,
            accum: Vec::new(),
            passes: 0,
        }
    }

    /// Number of completed render passes since the last reset.
    pub fn pass_count(&self) -> u32 {
        self.passes
    }

    fn reset_accumulation(&mut self) {
        self.accum.fill(Vec3::ZERO);
        self.passes = 0;
    }

    /// Closest hit across both BVH levels.
    fn trace(&self, ray: &Ray) -> Option<HitRecord> {
        let mut tri_of_best = 0u32;
        let (t, mesh) = self.tlas.intersect(ray, |mesh_idx, ray| {
            let (t, tri) = self.meshes[mesh_idx as usize].intersect(ray)?;
            tri_of_best = tri;
            Some(t)
        })?;
        let accel = &self.meshes[mesh as usize];
        let (v0, v1, v2) = accel.vertices(tri_of_best);
        let mut normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        if normal.dot(ray.dir) > 0.0 {
            normal = -normal; // two-sided shading
        }
        Some(HitRecord {
            point: ray.origin + ray.dir * t,
            normal,
            albedo: accel.color,
        })
    }

    fn occluded(&self, ray: &Ray) -> bool {
        self.tlas
            .intersect(ray, |mesh_idx, ray| {
                let (t, _) = self.meshes[mesh_idx as usize].intersect(ray)?;
                Some(t)
            })
            .is_some()
    }

    fn shade(&self, ray: &Ray) -> Vec3 {
        let Some(hit) = self.trace(ray) else {
            return sky(ray.dir);
        };
        let light = LIGHT_DIR.normalize();
        let ndotl = hit.normal.dot(light).max(0.0);
        let mut direct = 0.0;
        if ndotl > 0.0 {
            let shadow = Ray::new(hit.point + hit.normal * 1e-3, light);
            if !self.occluded(&shadow) {
                direct = ndotl;
            }
        }
        hit.albedo * (AMBIENT + (1.0 - AMBIENT) * direct)
    }
}

struct HitRecord {
    point: Vec3,
    normal: Vec3,
    albedo: Vec3,
}

/// Simple vertical gradient for rays that escape the scene.
fn sky(dir: Vec3) -> Vec3 {
    let t = 0.5 * (dir.normalize_or_zero().y + 1.0);
    Vec3::splat(1.0).lerp(Vec3::new(0.45, 0.65, 1.0), t)
}

/// Orthonormal camera frame derived from a pose.
struct CameraFrame {
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    half_height: f32,
    half_width: f32,
}

impl CameraFrame {
    fn from_pose(pose: &CameraPose, width: u32, height: u32) -> Self {
        let forward = pose.look_dir().normalize();
        let right = forward.cross(pose.up).normalize();
        let up = right.cross(forward);
        let half_height = (FOV_Y_DEGREES.to_radians() * 0.5).tan();
        let aspect = width as f32 / height.max(1) as f32;
        Self {
            origin: pose.eye,
            forward,
            right,
            up,
            half_height,
            half_width: half_height * aspect,
        }
    }

    /// Primary ray through normalized screen coordinates in `[0, 1)`.
    fn primary_ray(&self, u: f32, v: f32) -> Ray {
        let sx = (2.0 * u - 1.0) * self.half_width;
        // Screen v grows downward; world up grows upward.
        let sy = (1.0 - 2.0 * v) * self.half_height;
        let dir = (self.forward + self.right * sx + self.up * sy).normalize();
        Ray::new(self.origin, dir)
    }
}

/// Deterministic jitter in `[0, 1)²` from pixel and pass indices.
fn jitter(x: u32, y: u32, pass: u32) -> (f32, f32) {
    // Pixel centers on the first pass keep single-pass output crisp and
    // make tests reproducible; later passes scatter across the pixel.
    if pass == 0 {
        return (0.5, 0.5);
    }
    let mut h = (x as u64) << 40 | (y as u64) << 16 | pass as u64;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    let a = (h & 0xff_ffff) as f32 / 16_777_216.0;
    let b = (h >> 24 & 0xff_ffff) as f32 / 16_777_216.0;
    (a, b)
}

impl RenderSession for CpuRenderSession {
    fn set_camera(&mut self, pose: CameraPose) {
        self.pose = pose;
        self.reset_accumulation();
    }

    fn render_one_pass(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let frame = CameraFrame::from_pose(&self.pose, self.width, self.height);
        let pass = self.passes;
        for y in 0..self.height {
            for x in 0..self.width {
                let (jx, jy) = jitter(x, y, pass);
                let u = (x as f32 + jx) / self.width as f32;
                let v = (y as f32 + jy) / self.height as f32;
                let ray = frame.primary_ray(u, v);
                let radiance = self.shade(&ray);
                self.accum[(y * self.width + x) as usize] += radiance;
            }
        }
        self.passes += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.accum = vec![Vec3::ZERO; width as usize * height as usize];
        self.passes = 0;
    }

    fn download_pixels(&mut self, dest: &mut [u32]) {
        assert_eq!(
            dest.len(),
            self.accum.len(),
            "destination buffer does not match render size"
        );
        let scale = 1.0 / self.passes.max(1) as f32;
        for (out, sum) in dest.iter_mut().zip(&self.accum) {
            let c = (*sum * scale).clamp(Vec3::ZERO, Vec3::ONE);
            // Gamma 2.0 is close enough for a preview viewer.
            let r = (c.x.sqrt() * 255.0) as u8;
            let g = (c.y.sqrt() * 255.0) as u8;
            let b = (c.z.sqrt() * 255.0) as u8;
            *out = pack_rgba8(r, g, b, 255);
        }
    }

    fn blas_build_time(&self) -> Duration {
        self.blas_time
    }

    fn tlas_build_time(&self) -> Duration {
        self.tlas_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayview_scene::mesh_color;

    /// One small triangle facing +Z, centered at the origin.
    fn small_triangle_model() -> Model {
        Model {
            meshes: vec![TriMesh {
                name: "tri".into(),
                positions: vec![
                    Vec3::new(-0.5, -0.5, 0.0),
                    Vec3::new(0.5, -0.5, 0.0),
                    Vec3::new(0.0, 0.5, 0.0),
                ],
                indices: vec![[0, 1, 2]],
                color: mesh_color(0),
            }],
        }
    }

    fn looking_at_origin() -> CameraPose {
        CameraPose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    }

    fn session(width: u32, height: u32) -> CpuRenderSession {
        let mut s = CpuRenderSession::new(small_triangle_model());
        s.set_camera(looking_at_origin());
        s.resize(width, height);
        s
    }

    #[test]
    fn center_pixel_hits_the_triangle() {
        let mut s = session(9, 9);
        s.render_one_pass();
        let mut pixels = vec![0u32; 81];
        s.download_pixels(&mut pixels);

        let center = pixels[4 * 9 + 4];
        let corner = pixels[0];
        assert_ne!(center, corner, "triangle should not cover the whole frame");
        // The corner ray escapes to the sky gradient, which is near-white up top.
        let [r, g, b, a] = rayview_common::unpack_rgba8(corner);
        assert_eq!(a, 255);
        assert!(r > 128 && g > 128 && b > 128);
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut a = session(16, 12);
        let mut b = session(16, 12);
        for _ in 0..3 {
            a.render_one_pass();
            b.render_one_pass();
        }
        let mut pa = vec![0u32; 16 * 12];
        let mut pb = vec![0u32; 16 * 12];
        a.download_pixels(&mut pa);
        b.download_pixels(&mut pb);
        assert_eq!(pa, pb);
    }

    #[test]
    fn camera_change_resets_accumulation() {
        let mut s = session(8, 8);
        for _ in 0..4 {
            s.render_one_pass();
        }
        assert_eq!(s.pass_count(), 4);

        s.set_camera(CameraPose::new(Vec3::new(3.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y));
        assert_eq!(s.pass_count(), 0);

        s.render_one_pass();
        let mut after_reset = vec![0u32; 64];
        s.download_pixels(&mut after_reset);

        let mut fresh = CpuRenderSession::new(small_triangle_model());
        fresh.set_camera(CameraPose::new(Vec3::new(3.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y));
        fresh.resize(8, 8);
        fresh.render_one_pass();
        let mut expected = vec![0u32; 64];
        fresh.download_pixels(&mut expected);

        assert_eq!(after_reset, expected);
    }

    #[test]
    fn resize_resets_accumulation_and_buffer() {
        let mut s = session(8, 8);
        s.render_one_pass();
        s.resize(4, 2);
        assert_eq!(s.pass_count(), 0);
        let mut pixels = vec![0u32; 8];
        s.download_pixels(&mut pixels);
    }

    #[test]
    fn resize_to_same_size_keeps_accumulation() {
        let mut s = session(8, 8);
        s.render_one_pass();
        s.resize(8, 8);
        assert_eq!(s.pass_count(), 1);
    }

    #[test]
    #[should_panic(expected = "destination buffer")]
    fn mismatched_download_buffer_panics() {
        let mut s = session(8, 8);
        let mut pixels = vec![0u32; 7];
        s.download_pixels(&mut pixels);
    }

    #[test]
    fn zero_sized_render_is_a_no_op() {
        let mut s = CpuRenderSession::new(small_triangle_model());
        s.set_camera(looking_at_origin());
        s.render_one_pass();
        let mut pixels = vec![];
        s.download_pixels(&mut pixels);
    }

    #[test]
    fn shadowed_point_loses_direct_light() {
        // A ground triangle with a large occluder between it and the light.
        let light = LIGHT_DIR.normalize();
        let ground = TriMesh {
            name: "ground".into(),
            positions: vec![
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![[0, 1, 2]],
            color: mesh_color(0),
        };
        let center = Vec3::new(0.0, 0.0, -1.0 / 3.0);
        let above = center + light * 2.0;
        let occluder = TriMesh {
            name: "occluder".into(),
            positions: vec![
                above + Vec3::new(-5.0, 0.0, -5.0),
                above + Vec3::new(5.0, 0.0, -5.0),
                above + Vec3::new(0.0, 0.0, 5.0),
            ],
            indices: vec![[0, 1, 2]],
            color: mesh_color(1),
        };

        let shaded = CpuRenderSession::new(Model {
            meshes: vec![ground.clone(), occluder],
        });
        let lit = CpuRenderSession::new(Model {
            meshes: vec![ground],
        });

        // Aim straight down at the ground centroid from below the occluder.
        let ray = Ray::new(center + Vec3::new(0.0, 0.5, 0.0), Vec3::NEG_Y);
        let with_shadow = shaded.shade(&ray);
        let without_shadow = lit.shade(&ray);
        assert!(with_shadow.length() < without_shadow.length());
    }

    #[test]
    fn build_times_are_recorded() {
        let s = CpuRenderSession::new(small_triangle_model());
        // Durations exist even for trivial models; exact values are
        // hardware-dependent and not asserted.
        let _ = s.blas_build_time();
        let _ = s.tlas_build_time();
    }
}
