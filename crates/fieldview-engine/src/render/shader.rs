use std::borrow::Cow;

/// Entry-point names the pipelines look up in the shader program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EntryPoints {
    /// Compute entry of the derivation stage.
    pub metrics: Cow<'static, str>,
    /// Full-screen triangle vertex entry, shared by both render pipelines.
    pub vertex: Cow<'static, str>,
    /// Fragment entry of the field-data path.
    pub field_fragment: Cow<'static, str>,
    /// Fragment entry of the direct path.
    pub direct_fragment: Cow<'static, str>,
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self {
            metrics: Cow::Borrowed("metrics_main"),
            vertex: Cow::Borrowed("vertex_main"),
            field_fragment: Cow::Borrowed("fragment_main"),
            direct_fragment: Cow::Borrowed("direct_fragment_main"),
        }
    }
}

/// A compiled shader module plus the names of its four entry points.
pub struct ShaderProgram {
    module: wgpu::ShaderModule,
    entry_points: EntryPoints,
}

impl ShaderProgram {
    /// WGSL source of the bundled program.
    pub const BUILTIN_WGSL: &'static str = include_str!("../shaders/fieldview.wgsl");

    /// Compiles the bundled program.
    pub fn builtin(device: &wgpu::Device) -> Self {
        Self::from_wgsl(
            device,
            "fieldview builtin shader",
            Self::BUILTIN_WGSL,
            EntryPoints::default(),
        )
    }

    /// Compiles a caller-supplied WGSL program.
    ///
    /// Compilation errors go through wgpu's own error channel.
    pub fn from_wgsl(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        entry_points: EntryPoints,
    ) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        Self {
            module,
            entry_points,
        }
    }

    /// Wraps an already compiled module.
    pub fn from_module(module: wgpu::ShaderModule, entry_points: EntryPoints) -> Self {
        Self {
            module,
            entry_points,
        }
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }
}

/// Line layout read by the bundled shader.
///
/// Custom shaders may interpret the 116 line bytes however they like; these
/// offsets only describe [`ShaderProgram::BUILTIN_WGSL`].
pub mod builtin_line {
    pub const FLAGS: usize = 0;
    pub const TOTAL_CHARS: usize = 2;
    pub const BACK_PORCH: usize = 3;
    pub const CHAR_DATA: usize = 16;
    pub const MAX_CHARS: usize = 100;

    /// Flag bit: the line is part of the visible frame.
    pub const DISPLAYED: u8 = 0b01;
    /// Flag bit: the line carries character bytes; otherwise it renders black.
    pub const HAS_BYTES: u8 = 0b10;

    /// Pixel width of one character cell; one byte covers one cell, MSB first.
    pub const CELL_WIDTH: u32 = 8;
    /// Pixel rows per line.
    pub const LINE_HEIGHT: u32 = 2;
}
