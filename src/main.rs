use formfill::{FsTemplateStore, RenderError, Renderer, SofficeConverter, TemplateId};
use serde_json::Value;
use std::env;
use std::fs;
use std::process;
use std::sync::Arc;

/// A simple CLI to fill a stored template with a JSON payload.
fn main() -> Result<(), RenderError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        eprintln!("Fill a document template with JSON data and write the resulting PDF.");
        eprintln!();
        eprintln!(
            "Usage: {} <templates-dir> <template-id> <path/to/data.json> <path/to/output.pdf>",
            args[0]
        );
        process::exit(2);
    }
    let (templates_dir, template_id, data_path, output_path) =
        (&args[1], &args[2], &args[3], &args[4]);

    let payload: Value = serde_json::from_str(&fs::read_to_string(data_path)?)?;

    // Office-format templates need LibreOffice; PDF templates do not, so a
    // missing binary only degrades, it does not abort.
    let converter: Option<Arc<dyn formfill::DocumentConverter>> =
        match SofficeConverter::discover() {
            Ok(converter) => Some(Arc::new(converter)),
            Err(e) => {
                log::warn!("{} - docx/xlsx templates will not render", e);
                None
            }
        };

    let store = Arc::new(FsTemplateStore::new(templates_dir));
    let renderer = Renderer::new(store, converter);

    let pdf = renderer.render(&TemplateId::from(template_id.as_str()), &payload)?;
    fs::write(output_path, &pdf)?;
    println!("Wrote {} ({} bytes)", output_path, pdf.len());
    Ok(())
}
