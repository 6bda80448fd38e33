//! Built-in GLSL ES 3.00 program matching the render core's attribute and
//! uniform names.

const VERTEX_SHADER: &str = r#"#version 300 es
in vec3 position;
in vec3 normal;

uniform mat4 ModelView;
uniform mat4 Projection;
uniform mat3 InvTransModelView;
uniform bool usePhong;
uniform bool drawPoint;
uniform float pointSize;
uniform vec4 lightPosition;

out vec3 fN;
out vec3 fE;
out vec3 fL;

void main() {
    vec4 eyePosition = ModelView * vec4(position, 1.0);
    fN = vec3(0.0);
    fE = vec3(0.0);
    fL = vec3(0.0);
    if (usePhong) {
        fN = InvTransModelView * normal;
        fE = -eyePosition.xyz;
        fL = lightPosition.w == 0.0 ? lightPosition.xyz : lightPosition.xyz - eyePosition.xyz;
    }
    gl_PointSize = drawPoint ? pointSize : 1.0;
    gl_Position = Projection * eyePosition;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

uniform bool usePhong;
uniform float shininess;
uniform vec4 ambientProd;
uniform vec4 diffuseProd;
uniform vec4 specularProd;

in vec3 fN;
in vec3 fE;
in vec3 fL;

out vec4 fragColor;

void main() {
    if (!usePhong) {
        fragColor = diffuseProd;
        return;
    }
    vec3 N = normalize(fN);
    vec3 E = normalize(fE);
    vec3 L = normalize(fL);
    vec3 H = normalize(L + E);

    float kd = max(dot(L, N), 0.0);
    float ks = kd > 0.0 ? pow(max(dot(N, H), 0.0), shininess) : 0.0;
    vec4 color = ambientProd + kd * diffuseProd + ks * specularProd;
    fragColor = vec4(color.rgb, ambientProd.a);
}
"#;

/// A vertex/fragment source pair handed to the shader compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

impl Default for ShaderSource {
    fn default() -> Self {
        Self::new(VERTEX_SHADER, FRAGMENT_SHADER)
    }
}
