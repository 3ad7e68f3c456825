//! Plain-text PPM output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use lux_renderer::{color_to_rgba, FrameBuffer};

pub fn save_ppm(frame: &FrameBuffer, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ppm(frame, &mut writer)?;
    writer.flush()
}

pub fn write_ppm<W: Write>(frame: &FrameBuffer, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", frame.width(), frame.height())?;
    writeln!(writer, "255")?;

    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let rgba = color_to_rgba(frame.get(x, y));
            writeln!(writer, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
        }
    }

    Ok(())
}
