use crate::{Asset, Color};
use anyhow::Result;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Density ImageMagick rasterizes vector sources at when none is given.
pub const BASE_DENSITY_DPI: u32 = 72;

/// Density a vector source is rendered at for `scale`, truncated to whole dpi.
pub fn scaled_density(scale: f64) -> u32 {
    (scale * BASE_DENSITY_DPI as f64) as u32
}

/// A single `convert` invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MagickCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl MagickCommand {
    fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Appends whitespace separated operators. Never used for paths.
    fn ops(&mut self, ops: impl AsRef<str>) -> &mut Self {
        self.args
            .extend(ops.as_ref().split_whitespace().map(OsString::from));
        self
    }

    fn file(&mut self, path: &Path) -> &mut Self {
        self.args.push(path.as_os_str().to_owned());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|arg| arg.as_os_str())
    }

    /// Last argument, the file `convert` writes.
    pub fn output(&self) -> Option<&Path> {
        self.args.last().map(Path::new)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl std::fmt::Display for MagickCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", quote(self.program.as_os_str()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+-_./:%=,@".contains(c));
    if plain {
        arg.into_owned()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Builds the commands for one ImageMagick `convert` binary.
#[derive(Clone, Debug)]
pub struct Magick {
    program: PathBuf,
}

impl Default for Magick {
    fn default() -> Self {
        Self::new(if cfg!(target_os = "windows") {
            "convert.exe"
        } else {
            "convert"
        })
    }
}

impl Magick {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Rasterizes `asset` at `scale` times the mdpi size.
    ///
    /// Plain assets are rendered straight at the scaled density, which keeps
    /// vector sources sharp. Nine-patches need their 1px border to stay 1px
    /// and fully opaque, so the border is cut out, resized and thresholded on
    /// its own, grown back to the outer edge and laid over the scaled body.
    pub fn scale(&self, asset: &Asset, dest: &Path, scale: f64) -> Result<MagickCommand> {
        anyhow::ensure!(
            scale.is_finite() && scale > 0.0,
            "invalid scale factor {}",
            scale
        );
        let density = scaled_density(scale);
        anyhow::ensure!(
            density > 0,
            "scale factor {} renders below 1 dpi",
            scale
        );
        let mut cmd = MagickCommand::new(&self.program);
        if !asset.is_nine_patch() {
            cmd.ops(format!("-background transparent -density {}", density))
                .file(asset.path())
                .file(dest);
            return Ok(cmd);
        }

        let percent = scale * 100.0;
        let border = scale.ceil() as u32;
        let grow = border - 1;
        cmd.file(asset.path())
            .ops("-background transparent")
            // 1: body rendered at base density
            .ops(format!("( +clone -density {} )", BASE_DENSITY_DPI))
            // 2-3: keep only the border
            .ops("( +clone -shave 1x1 -bordercolor transparent -border 1x1 )")
            .ops("( -clone 1 +clone -compose ChangeMask -composite -compose Over )")
            // 4-5: scale the border and make its pixels opaque again
            .ops(format!("( +clone -resize {}% )", percent))
            .ops("( +clone -channel A -threshold 50% +channel )")
            // 6-7: cut the scaled border back out
            .ops("( +clone -shave 1x1 -bordercolor transparent -border 1x1 )")
            .ops("( -clone 5 +clone -compose ChangeMask -composite -compose Over )")
            // 8-12: push each edge outwards so it hugs the image bounds
            .ops(format!("( -clone 7 -repage +{}+0 -background none -flatten )", grow))
            .ops(format!("( -clone 7 -repage +0+{} -background none -flatten )", grow))
            .ops(format!("( -clone 7 -repage -{}+0 -background none -flatten )", grow))
            .ops(format!("( -clone 7 -repage +0-{} -background none -flatten )", grow))
            .ops(format!(
                "( -clone 8 -clone 9 -compose Over -composite -clone 10 -composite -clone 11 -composite -shave {0}x{0} )",
                grow
            ))
            // 13-15: scaled body without its border, merged with the new one
            .ops(format!("( -clone 0 -scale {}% )", percent))
            .ops(format!(
                "( +clone -shave {0}x{0} -bordercolor transparent -border 1x1 )",
                border
            ))
            .ops("( +clone -clone 12 -composite )")
            .ops("( -delete 0-14 )")
            .file(dest);
        Ok(cmd)
    }

    /// Replaces every tone of `asset` with `color`, keeping its alpha. The
    /// border of a nine-patch is left untouched.
    pub fn fill(&self, asset: &Asset, dest: &Path, color: &Color) -> MagickCommand {
        let level = format!("{},", color.hex());
        let mut cmd = MagickCommand::new(&self.program);
        cmd.ops("-background transparent").file(asset.path());
        if asset.is_nine_patch() {
            cmd.ops(format!(
                "( +clone -shave 1x1 -bordercolor transparent -border 1x1 +level-colors {} )",
                level
            ))
            .ops("( -clone 0 +clone -composite )")
            .ops("( -delete 0-1 )");
        } else {
            cmd.ops(format!("+level-colors {}", level));
        }
        cmd.file(dest);
        cmd
    }

    /// Overlays `color` on a grayscale `asset` so its shading survives, then
    /// masks the result with the source alpha. The border of a nine-patch is
    /// left untouched.
    pub fn tint(&self, asset: &Asset, dest: &Path, color: &Color) -> MagickCommand {
        let color = color.hex();
        let mut cmd = MagickCommand::new(&self.program);
        cmd.ops("-background transparent").file(asset.path());
        if asset.is_nine_patch() {
            cmd.ops("( +clone -shave 1x1 -bordercolor transparent -border 1x1 )")
                .ops(format!("( +clone +matte -fill {} -colorize 100% )", color))
                .ops("( -clone 0 +clone -compose overlay -composite )")
                .ops("( -clone 0 +clone -compose SrcIn -composite )")
                .ops("( -delete 0-3 )");
        } else {
            cmd.ops(format!(
                "( +clone +matte -fill {} -colorize 100% +clone +swap -compose overlay -composite )",
                color
            ))
            .ops("-compose SrcIn -composite");
        }
        cmd.file(dest);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &MagickCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn count(cmd: &MagickCommand, arg: &str) -> usize {
        cmd.args().iter().filter(|a| *a == arg).count()
    }

    #[test]
    fn scale_at_base_density() -> Result<()> {
        let asset = Asset::new("/res/drawable/icon.pdf")?;
        let cmd = Magick::new("convert").scale(&asset, Path::new("/out/icon_scaled.png"), 1.0)?;
        assert_eq!(cmd.program(), Path::new("convert"));
        assert_eq!(
            args(&cmd),
            [
                "-background",
                "transparent",
                "-density",
                "72",
                "/res/drawable/icon.pdf",
                "/out/icon_scaled.png"
            ]
        );
        assert_eq!(
            cmd.value_of("-density").unwrap(),
            BASE_DENSITY_DPI.to_string().as_str()
        );
        Ok(())
    }

    #[test]
    fn scale_density_truncates() -> Result<()> {
        let asset = Asset::new("icon.svg")?;
        let magick = Magick::default();
        for (scale, density) in [(0.75, "54"), (1.5, "108"), (2.0, "144"), (3.0, "216")] {
            let cmd = magick.scale(&asset, Path::new("out.png"), scale)?;
            assert_eq!(cmd.value_of("-density").unwrap(), density);
        }
        Ok(())
    }

    #[test]
    fn scale_rejects_bad_factor() -> Result<()> {
        let asset = Asset::new("icon.svg")?;
        let magick = Magick::default();
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY, 0.01, 1.0 / 73.0] {
            assert!(magick.scale(&asset, Path::new("out.png"), scale).is_err());
        }
        Ok(())
    }

    #[test]
    fn smallest_scale_renders_at_one_dpi() -> Result<()> {
        let asset = Asset::new("icon.svg")?;
        let cmd = Magick::default().scale(&asset, Path::new("out.png"), 1.0 / 72.0)?;
        assert_eq!(cmd.value_of("-density").unwrap(), "1");
        Ok(())
    }

    #[test]
    fn scale_nine_patch() -> Result<()> {
        let asset = Asset::new("/res/drawable/bubble.9.pdf")?;
        let dest = Path::new("/out/bubble_scaled.9.png");
        let cmd = Magick::new("convert").scale(&asset, dest, 1.5)?;
        let args = args(&cmd);
        assert_eq!(args[0], "/res/drawable/bubble.9.pdf");
        assert_eq!(args.last().unwrap(), "/out/bubble_scaled.9.png");
        assert_eq!(cmd.output(), Some(dest));
        // border is extracted at base density
        assert_eq!(cmd.value_of("-density").unwrap(), "72");
        assert_eq!(cmd.value_of("-resize").unwrap(), "150%");
        assert_eq!(cmd.value_of("-scale").unwrap(), "150%");
        assert_eq!(cmd.value_of("-repage").unwrap(), "+1+0");
        assert!(args.iter().any(|a| a == "+0-1"));
        assert!(args.windows(2).any(|w| w == ["-shave", "2x2"]));
        assert!(args.windows(2).any(|w| w == ["-delete", "0-14"]));
        assert_eq!(count(&cmd, "("), count(&cmd, ")"));
        assert_eq!(count(&cmd, "("), 16);
        Ok(())
    }

    #[test]
    fn scale_nine_patch_downscale() -> Result<()> {
        let asset = Asset::new("bubble.9.png")?;
        let cmd = Magick::default().scale(&asset, Path::new("out.9.png"), 0.75)?;
        assert_eq!(cmd.value_of("-resize").unwrap(), "75%");
        assert_eq!(cmd.value_of("-repage").unwrap(), "+0+0");
        assert!(args(&cmd).windows(2).any(|w| w == ["-shave", "1x1"]));
        Ok(())
    }

    #[test]
    fn fill_plain() -> Result<()> {
        let asset = Asset::new("/out/icon_scaled.png")?;
        let color: Color = "FF0000".parse()?;
        let cmd = Magick::new("convert").fill(&asset, Path::new("/out/icon.png"), &color);
        assert_eq!(
            args(&cmd),
            [
                "-background",
                "transparent",
                "/out/icon_scaled.png",
                "+level-colors",
                "#FF0000,",
                "/out/icon.png"
            ]
        );
        Ok(())
    }

    #[test]
    fn fill_nine_patch_keeps_border() -> Result<()> {
        let asset = Asset::new("/out/bubble_scaled.9.png")?;
        let color: Color = "336699".parse()?;
        let cmd = Magick::new("convert").fill(&asset, Path::new("/out/bubble.9.png"), &color);
        let args = args(&cmd);
        let shave = args.iter().position(|a| a == "-shave").unwrap();
        let level = args.iter().position(|a| a == "+level-colors").unwrap();
        assert!(shave < level);
        assert_eq!(args[level + 1], "#336699,");
        assert!(args.windows(2).any(|w| w == ["-delete", "0-1"]));
        assert_eq!(count(&cmd, "("), count(&cmd, ")"));
        Ok(())
    }

    #[test]
    fn tint_plain() -> Result<()> {
        let asset = Asset::new("/res/drawable-mdpi/gray.png")?;
        let color: Color = "00FF00".parse()?;
        let cmd = Magick::new("convert").tint(&asset, Path::new("/out/gray.png"), &color);
        let args = args(&cmd);
        assert_eq!(cmd.value_of("-fill").unwrap(), "#00FF00");
        assert_eq!(cmd.value_of("-colorize").unwrap(), "100%");
        // overlay keeps the shading, SrcIn keeps the alpha
        let overlay = args.iter().position(|a| a == "overlay").unwrap();
        let src_in = args.iter().position(|a| a == "SrcIn").unwrap();
        assert!(overlay < src_in);
        assert_eq!(args.last().unwrap(), "/out/gray.png");
        Ok(())
    }

    #[test]
    fn tint_nine_patch() -> Result<()> {
        let asset = Asset::new("/res/drawable-mdpi/icon_gray.9.png")?;
        let color: Color = "336699".parse()?;
        let cmd = Magick::new("convert").tint(&asset, Path::new("/out/icon_gray.9.png"), &color);
        let args = args(&cmd);
        assert_eq!(cmd.value_of("-shave").unwrap(), "1x1");
        assert!(args.windows(2).any(|w| w == ["-delete", "0-3"]));
        assert_eq!(count(&cmd, "("), 5);
        assert_eq!(count(&cmd, "("), count(&cmd, ")"));
        Ok(())
    }

    #[test]
    fn display_quotes_paths() -> Result<()> {
        let asset = Asset::new("/my res/it's.png")?;
        let color: Color = "123456".parse()?;
        let cmd = Magick::new("convert").fill(&asset, Path::new("/out/a.png"), &color);
        assert_eq!(
            cmd.to_string(),
            "convert -background transparent '/my res/it'\\''s.png' +level-colors '#123456,' /out/a.png"
        );
        Ok(())
    }
}
