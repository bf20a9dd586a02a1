//! Screen capture through the scope's own file system.
//!
//! The DPO7000 cannot stream a hardcopy directly. It prints the screen to a
//! temporary file on its internal drive, the file is read back unframed
//! with `FILESystem:READFile`, and then deleted.

use ivilib_core::{Result, Session, ValueTranslator};

/// Name used when rejecting an unknown image format.
pub const SCREENSHOT_FORMAT: &str = "display.screenshot_format";

/// Scratch file on the scope's drive.
pub const SCREENSHOT_FILE: &str = "C:\\Temp.png";

/// Image formats the export path supports.
pub fn screenshot_formats() -> Result<ValueTranslator> {
    ValueTranslator::new(SCREENSHOT_FORMAT, &[("png", "PNG")])
}

/// Print the screen to [`SCREENSHOT_FILE`], read it back and delete it.
pub(crate) async fn capture(session: &mut Session, token: &str) -> Result<Vec<u8>> {
    session.write("HARDCopy:PORT FILE;").await?;
    session.write(&format!("EXPort:FORMat {token}")).await?;
    session
        .write(&format!("HARDCopy:FILEName \"{SCREENSHOT_FILE}\""))
        .await?;
    session.write("HARDCopy STARt").await?;
    let image = session
        .query_raw(&format!("FILESystem:READFile \"{SCREENSHOT_FILE}\""))
        .await?;
    session
        .write(&format!("FILESystem:DELEte \"{SCREENSHOT_FILE}\""))
        .await?;
    Ok(image)
}
