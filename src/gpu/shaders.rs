/// WGSL shader code for display rendering and the histogram
///
/// The render shader is assembled from three pieces: a shared vertex stage
/// and lighting transform, plus one fragment stage per source kind.
/// Lighting is applied in linear light and encoded to gamma at the end,
/// unless the target format already does that encoding.

use super::cache::ShaderId;

// ========== Shared: vertex stage and lighting ==========
const COMMON: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

// Must match UvWindow (16 bytes): the part of the source that is visible
struct ViewParams {
    uv_offset: vec2<f32>,
    uv_scale: vec2<f32>,
}

@group(0) @binding(4)
var<uniform> visible: ViewParams;

// Full-screen quad as a 4-vertex triangle strip (no vertex buffers needed)
// 0: top-left, 1: top-right, 2: bottom-left, 3: bottom-right
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var output: VertexOutput;
    let corner = vec2<f32>(f32(vertex_index & 1u), f32(vertex_index >> 1u));
    output.clip_position = vec4<f32>(corner.x * 2.0 - 1.0, 1.0 - corner.y * 2.0, 0.0, 1.0);
    output.uv = visible.uv_offset + corner * visible.uv_scale;
    return output;
}

// Must match GpuLightingParams (48 bytes)
struct LightingParams {
    exposure: f32,     // stops
    contrast: f32,     // multiplier, 1 = none
    saturation: f32,   // multiplier, 1 = none
    vibrance: f32,
    highlights: f32,
    shadows: f32,
    whites: f32,
    blacks: f32,
    tint: f32,
    temperature: f32,
    hue: f32,          // degrees
    _pad: f32,
}

@group(0) @binding(0)
var<uniform> params: LightingParams;

const LUMA: vec3<f32> = vec3<f32>(0.2126, 0.7152, 0.0722);

fn to_linear(c: vec3<f32>) -> vec3<f32> {
    return pow(max(c, vec3<f32>(0.0)), vec3<f32>(2.2));
}

fn rotate_hue(c: vec3<f32>, degrees: f32) -> vec3<f32> {
    let angle = radians(degrees);
    let k = vec3<f32>(0.57735);
    let cos_a = cos(angle);
    return c * cos_a + cross(k, c) * sin(angle) + k * dot(k, c) * (1.0 - cos_a);
}

fn apply_lighting(linear: vec3<f32>) -> vec3<f32> {
    // 1. Exposure
    var color = linear * exp2(params.exposure);

    // 2. White balance shifts
    color = color * vec3<f32>(
        1.0 + params.temperature * 0.2,
        1.0 - params.tint * 0.2,
        1.0 - params.temperature * 0.2
    );

    // 3. Highlights & shadows, weighted by luminance
    let tone_lum = clamp(dot(color, LUMA), 0.0, 1.0);
    color = color * (1.0 + tone_lum * params.highlights);
    color = color * (1.0 + (1.0 - tone_lum) * params.shadows);

    // 4. Levels: whites move the white point, blacks the black point
    let black_point = params.blacks * 0.1;
    let white_point = 1.0 - params.whites * 0.25;
    color = (color - vec3<f32>(black_point)) / max(white_point - black_point, 0.0001);
    color = max(color, vec3<f32>(0.0));

    // 5. Contrast around mid-grey (in display space)
    color = pow(color, vec3<f32>(1.0 / 2.2));
    color = (color - 0.5) * params.contrast + 0.5;

    // 6. Saturation, vibrance, hue
    let lum = dot(color, LUMA);
    color = mix(vec3<f32>(lum), color, params.saturation);
    let chroma = max(max(color.r, color.g), color.b) - min(min(color.r, color.g), color.b);
    color = mix(vec3<f32>(lum), color, 1.0 + params.vibrance * (1.0 - clamp(chroma, 0.0, 1.0)));
    color = rotate_hue(color, params.hue);

    color = clamp(color, vec3<f32>(0.0), vec3<f32>(1.0));
    if OUTPUT_IS_SRGB {
        // The target encodes on write
        color = to_linear(color);
    }
    return color;
}
"#;

// ========== Bitmap source ==========
const RGBA_FRAGMENT: &str = r#"
@group(0) @binding(1)
var source_sampler: sampler;

@group(0) @binding(2)
var source: texture_2d<f32>;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(source, source_sampler, input.uv);
    return vec4<f32>(apply_lighting(to_linear(texel.rgb)), texel.a);
}
"#;

// ========== Sensor mosaic source ==========
const MOSAIC_FRAGMENT: &str = r#"
@group(0) @binding(1)
var source_sampler: sampler;  // Unused: integer textures are read with textureLoad

@group(0) @binding(2)
var mosaic: texture_2d<u32>;

// Must match GpuSensorParams (16 bytes)
struct SensorParams {
    black_level: f32,
    white_level: f32,
    cfa_phase: vec2<u32>,  // Position of the red photosite in the 2x2 tile
}

@group(0) @binding(3)
var<uniform> sensor: SensorParams;

fn sample_raw(coords: vec2<i32>) -> f32 {
    let dims = vec2<i32>(textureDimensions(mosaic));
    let clamped = clamp(coords, vec2<i32>(0), dims - vec2<i32>(1));
    let raw_value = f32(textureLoad(mosaic, clamped, 0).r);
    let range = max(sensor.white_level - sensor.black_level, 1.0);
    return clamp((raw_value - sensor.black_level) / range, 0.0, 1.0);
}

// Bilinear reconstruction on an RGGB grid shifted by cfa_phase
fn demosaic(p: vec2<i32>) -> vec3<f32> {
    let site = (vec2<u32>(p) + vec2<u32>(2u) - sensor.cfa_phase % 2u) % 2u;

    let center = sample_raw(p);
    let left = sample_raw(p + vec2<i32>(-1, 0));
    let right = sample_raw(p + vec2<i32>(1, 0));
    let up = sample_raw(p + vec2<i32>(0, -1));
    let down = sample_raw(p + vec2<i32>(0, 1));
    let cross_avg = (left + right + up + down) * 0.25;
    let diag_avg = (sample_raw(p + vec2<i32>(-1, -1)) + sample_raw(p + vec2<i32>(1, -1))
        + sample_raw(p + vec2<i32>(-1, 1)) + sample_raw(p + vec2<i32>(1, 1))) * 0.25;
    let horizontal = (left + right) * 0.5;
    let vertical = (up + down) * 0.5;

    var rgb: vec3<f32>;
    if site.x == 0u && site.y == 0u {
        // Red photosite
        rgb = vec3<f32>(center, cross_avg, diag_avg);
    } else if site.x == 1u && site.y == 1u {
        // Blue photosite
        rgb = vec3<f32>(diag_avg, cross_avg, center);
    } else if site.y == 0u {
        // Green on a red row
        rgb = vec3<f32>(horizontal, center, vertical);
    } else {
        // Green on a blue row
        rgb = vec3<f32>(vertical, center, horizontal);
    }
    return rgb;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let dims = textureDimensions(mosaic);
    let pixel = min(vec2<u32>(input.uv * vec2<f32>(dims)), dims - vec2<u32>(1u));
    return vec4<f32>(apply_lighting(demosaic(vec2<i32>(pixel))), 1.0);
}
"#;

/// Build the render shader for a source kind and target encoding
pub fn render_shader(shader: ShaderId, output_is_srgb: bool) -> String {
    let fragment = match shader {
        ShaderId::RenderMosaic => MOSAIC_FRAGMENT,
        _ => RGBA_FRAGMENT,
    };
    format!(
        "const OUTPUT_IS_SRGB: bool = {};\n{}{}",
        output_is_srgb, COMMON, fragment
    )
}

/// Histogram pass 1
///
/// One invocation per pixel in 16x16 workgroups; each atomically bumps one
/// bin per channel: R in 0..256, G in 256..512, B in 512..768.
pub const HISTOGRAM_COUNT_SHADER: &str = r#"
@group(0) @binding(0)
var source: texture_2d<f32>;

@group(0) @binding(1)
var<storage, read_write> bins: array<atomic<u32>, 768>;

@compute @workgroup_size(16, 16)
fn count_bins(@builtin(global_invocation_id) id: vec3<u32>) {
    let dims = textureDimensions(source);
    if id.x >= dims.x || id.y >= dims.y {
        return;
    }
    let texel = textureLoad(source, vec2<i32>(id.xy), 0);
    let level = vec3<u32>(clamp(round(texel.rgb * 255.0), vec3<f32>(0.0), vec3<f32>(255.0)));
    atomicAdd(&bins[level.r], 1u);
    atomicAdd(&bins[256u + level.g], 1u);
    atomicAdd(&bins[512u + level.b], 1u);
}
"#;

/// Histogram pass 2
///
/// A single 256-wide workgroup finds the global maximum across all three
/// channels and scales every bin to 0..100.
pub const HISTOGRAM_NORMALIZE_SHADER: &str = r#"
@group(0) @binding(0)
var<storage, read> counts: array<u32, 768>;

@group(0) @binding(1)
var<storage, read_write> normalized: array<f32, 768>;

var<workgroup> peak: atomic<u32>;

@compute @workgroup_size(256)
fn normalize_bins(@builtin(local_invocation_index) i: u32) {
    atomicMax(&peak, max(counts[i], max(counts[256u + i], counts[512u + i])));
    workgroupBarrier();
    let max_count = atomicLoad(&peak);

    for (var channel = 0u; channel < 3u; channel++) {
        let index = channel * 256u + i;
        if max_count == 0u {
            normalized[index] = 0.0;
        } else {
            normalized[index] = f32(counts[index]) / f32(max_count) * 100.0;
        }
    }
}
"#;
