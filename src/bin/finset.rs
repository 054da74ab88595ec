//! finset CLI: Fast Infoset → XML oder Event-Liste.

#[cfg(feature = "fast-alloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand};
use finset::byte_cursor::ByteCursor;
use finset::xml_writer::write_document;
use finset::{Cursor, Decoder, DecoderOptions, EventKind};
use std::io::{BufWriter, IsTerminal, Read, Write};
use std::process;

#[derive(Parser)]
#[command(name = "finset", about = "Fast Infoset (X.891) decoder")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode Fast Infoset to XML
    Xml(CommonArgs),
    /// Print the cursor events, one per line
    Events(CommonArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Read chunk size in bytes
    #[arg(long, default_value_t = finset::byte_cursor::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Cap for attribute-value, content-chunk and other-string tables
    #[arg(long)]
    max_table_entries: Option<usize>,
}

impl CommonArgs {
    fn to_options(&self) -> DecoderOptions {
        let mut opts = DecoderOptions::default().with_buffer_size(self.buffer_size);
        opts.set_maximum_table_entries(self.max_table_entries);
        opts
    }
}

type InputDecoder = Decoder<ByteCursor<Box<dyn Read>>>;

fn open_input(path: &str) -> Result<Box<dyn Read>, String> {
    if path == "-" {
        if std::io::stdin().is_terminal() {
            eprintln!("Lese von stdin (Ctrl+D zum Beenden)...");
        }
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = std::fs::File::open(path).map_err(|e| format!("Lesefehler '{path}': {e}"))?;
    Ok(Box::new(file))
}

fn create_writer(path: Option<&str>) -> Result<BufWriter<Box<dyn Write>>, String> {
    let inner: Box<dyn Write> = match path {
        None | Some("-") => Box::new(std::io::stdout().lock()),
        Some(path) => Box::new(
            std::fs::File::create(path).map_err(|e| format!("Schreibfehler '{path}': {e}"))?,
        ),
    };
    Ok(BufWriter::new(inner))
}

fn create_decoder(args: &CommonArgs) -> Result<InputDecoder, String> {
    let input = open_input(&args.input)?;
    Decoder::with_options(input, args.to_options()).map_err(|e| format!("Ungueltige Optionen: {e}"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Xml(args) => run_xml(args),
        Command::Events(args) => run_events(args),
    }
}

fn run_xml(args: CommonArgs) -> Result<(), String> {
    let mut decoder = create_decoder(&args)?;
    let writer = create_writer(args.output.as_deref())?;
    let mut writer = write_document(&mut decoder, writer)
        .map_err(|e| format!("Decode-Fehler bei Byte {}: {e}", decoder.position()))?;
    writer.write_all(b"\n").map_err(|e| format!("Schreibfehler: {e}"))?;
    writer.flush().map_err(|e| format!("Schreibfehler: {e}"))
}

fn run_events(args: CommonArgs) -> Result<(), String> {
    let mut decoder = create_decoder(&args)?;
    let mut writer = create_writer(args.output.as_deref())?;
    loop {
        let kind = decoder
            .advance()
            .map_err(|e| format!("Decode-Fehler bei Byte {}: {e}", decoder.position()))?;
        let line = describe_event(&decoder, kind).map_err(|e| format!("Decode-Fehler: {e}"))?;
        writeln!(writer, "{line}").map_err(|e| format!("Schreibfehler: {e}"))?;
        if kind == EventKind::EndDocument {
            break;
        }
    }
    writer.flush().map_err(|e| format!("Schreibfehler: {e}"))
}

/// Eine Zeile pro Event; Namespaces und Attribute folgen eingerückt.
fn describe_event<C: Cursor>(cursor: &C, kind: EventKind) -> finset::Result<String> {
    let mut line = kind.as_str().to_string();
    match kind {
        EventKind::StartElement => {
            line.push_str(&format!(" {} (depth {})", cursor.name()?, cursor.depth()));
            for i in 0..cursor.namespace_count()? {
                let ns = cursor.namespace_at(i)?;
                line.push_str(&format!("\n  xmlns:{}={:?}", ns.prefix, &*ns.uri));
            }
            for i in 0..cursor.attribute_count()? {
                let at = cursor.attribute_at(i)?;
                line.push_str(&format!("\n  @{}={:?}", at.name, at.value()));
            }
        }
        EventKind::EndElement => line.push_str(&format!(" {}", cursor.name()?)),
        EventKind::Characters | EventKind::Cdata | EventKind::Comment => {
            line.push_str(&format!(" {:?}", cursor.text()?));
        }
        EventKind::ProcessingInstruction => {
            line.push_str(&format!(" {} {:?}", cursor.pi_target()?, cursor.pi_data()?));
        }
        EventKind::EntityReference => line.push_str(&format!(" &{};", cursor.local_name()?)),
        EventKind::StartDocument | EventKind::EndDocument | EventKind::Dtd => {}
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse cli")
    }

    #[test]
    fn to_options_maps_table_cap_and_buffer() {
        let cli = parse_cli(&[
            "finset", "xml", "-i", "in.finf", "--buffer-size", "256", "--max-table-entries", "9",
        ]);
        let Command::Xml(args) = cli.command else {
            panic!("expected xml command");
        };
        let opts = args.to_options();
        assert_eq!(opts.buffer_size(), 256);
        assert_eq!(opts.maximum_table_entries(), Some(9));
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let cli = parse_cli(&["finset", "events", "-i", "-", "--buffer-size", "0"]);
        let Command::Events(args) = cli.command else {
            panic!("expected events command");
        };
        let err = create_decoder(&args).err().expect("expected option error");
        assert!(err.contains("Ungueltige Optionen"));
    }

    #[test]
    fn describe_start_element_lists_attributes() {
        let bytes = [
            0xE0, 0x00, 0x00, 0x01, 0x00, 0x7C, 0x00, b'a', 0x78, 0x00, b'x', 0x00, b'1', 0xFF, 0xF0,
        ];
        let mut decoder = Decoder::from_slice(&bytes);
        let kind = decoder.advance().unwrap();
        let line = describe_event(&decoder, kind).unwrap();
        assert_eq!(line, "START_ELEMENT a (depth 1)\n  @x=\"1\"");
    }
}
