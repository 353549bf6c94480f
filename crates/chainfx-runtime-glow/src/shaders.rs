//! GLSL sources for the built-in passes.
//!
//! All passes share one vertex stage; attribute locations match `mesh::ATTRIB_*`.

pub const VERTEX: &str = r#"#version 330 core
layout (location = 0) in vec2 a_position;
layout (location = 1) in vec2 a_texcoord;
out vec2 v_uv;
void main() {
    v_uv = a_texcoord;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

pub const PASSTHROUGH_FRAG: &str = r#"#version 330 core
in vec2 v_uv;
out vec4 o_color;
uniform sampler2D u_texture;
void main() {
    o_color = texture(u_texture, v_uv);
}
"#;

pub const CONTRAST_FRAG: &str = r#"#version 330 core
in vec2 v_uv;
out vec4 o_color;
uniform sampler2D u_texture;
uniform float u_contrast;
void main() {
    vec4 c = texture(u_texture, v_uv);
    o_color = vec4(clamp((c.rgb - 0.5) * u_contrast + 0.5, 0.0, 1.0), c.a);
}
"#;

pub const SATURATION_FRAG: &str = r#"#version 330 core
in vec2 v_uv;
out vec4 o_color;
uniform sampler2D u_texture;
uniform float u_saturation;
const vec3 LUMA = vec3(0.2125, 0.7154, 0.0721);
void main() {
    vec4 c = texture(u_texture, v_uv);
    vec3 grey = vec3(dot(c.rgb, LUMA));
    o_color = vec4(clamp(mix(grey, c.rgb, u_saturation), 0.0, 1.0), c.a);
}
"#;

pub const BRIGHTNESS_FRAG: &str = r#"#version 330 core
in vec2 v_uv;
out vec4 o_color;
uniform sampler2D u_texture;
uniform float u_brightness;
void main() {
    vec4 c = texture(u_texture, v_uv);
    o_color = vec4(clamp(c.rgb + vec3(u_brightness), 0.0, 1.0), c.a);
}
"#;

/// One-dimensional 5-tap blur (3 weights, mirrored). `u_step` is one texel along the blur axis.
pub const BLUR_FRAG: &str = r#"#version 330 core
in vec2 v_uv;
out vec4 o_color;
uniform sampler2D u_texture;
uniform vec2 u_step;
uniform float u_weight[3];
uniform float u_offset[3];
void main() {
    vec4 sum = texture(u_texture, v_uv + u_step * u_offset[0]) * u_weight[0];
    for (int i = 1; i < 3; ++i) {
        vec2 d = u_step * u_offset[i];
        sum += texture(u_texture, v_uv + d) * u_weight[i];
        sum += texture(u_texture, v_uv - d) * u_weight[i];
    }
    o_color = sum;
}
"#;
