fn main() -> anyhow::Result<()> {
    let command_line_interface = json_mend::cli::CommandLineInterface::load();
    command_line_interface.run()
}
