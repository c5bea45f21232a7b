//! Static help text constants for CLI commands.
//!
//! Each `*_HELP` constant is the long description shown by
//! `help <command>` and `<command> -h`.

pub const SHORT_NAME: &str = "redfish";
pub const LONG_NAME: &str = "Redfish Utility";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COPYRIGHT: &str = "Redfish Utility Developers. Licensed under MIT OR Apache-2.0.";
pub const PROMPT: &str = "redfish > ";

pub const GLOBAL_USAGE: &str = "redfish [GLOBAL OPTIONS] [COMMAND] [ARGUMENTS] [COMMAND OPTIONS]";

pub const HELP_FOOTER: &str = "See help on a specific command with 'help <command>'.";

pub(crate) const LOGIN_HELP: &str = "Connects to a server and establishes a secure session.

If no URL is given the URL from the configuration file is used. Username
and password fall back to the configuration file as well.

EXAMPLES:
    login 10.0.0.100 -u admin -p password
    login https://ilo.example.com -u admin -p password --selector Bios.";

pub(crate) const SELECT_HELP: &str = "Selects the resource type that get, set and commit work on.

Without an argument the current selection is printed.

EXAMPLES:
    select Bios.
    select ComputerSystem.";

pub(crate) const GET_HELP: &str = "Prints properties of the selected resources as JSON.

Without property names every settable property is printed.

EXAMPLES:
    get BootMode
    get --selector ComputerSystem. AssetTag IndicatorLED";

pub(crate) const SET_HELP: &str = "Stages property changes on the selected resources.

Changes are sent to the server by 'commit', or immediately with --commit.

EXAMPLES:
    set BootMode=Uefi
    set AdminName=ops --selector Bios. --commit --reboot ForceRestart";

pub(crate) const COMMIT_HELP: &str = "Applies all staged changes to the server.

EXAMPLES:
    commit
    commit --reboot GracefulRestart";

pub(crate) const REBOOT_HELP: &str = "Resets the server.

RESET TYPES:
    On, ForceOff, GracefulShutdown, GracefulRestart, ForceRestart (default),
    Nmi, PushPowerButton

EXAMPLES:
    reboot
    reboot GracefulShutdown";

pub(crate) const BIOSDEFAULTS_HELP: &str = "Sets the currently logged in server's BIOS settings to defaults.

By default the factory defaults are restored. Use --userdefaults to restore
the user defaults instead, or --manufacturingdefaults to restore the
manufacturing defaults. A reboot is required before the changes take effect.

EXAMPLES:
    biosdefaults
    biosdefaults --userdefaults --reboot ForceRestart
    biosdefaults --url 10.0.0.100 -u admin -p password --manufacturingdefaults";

pub(crate) const ONEBUTTONERASE_HELP: &str = "Performs One Button Erase on a system.

Erases all BIOS settings, management controller settings and user data,
then monitors the erase until it finishes. The system restarts during the
process and the session is ended afterwards.

EXAMPLES:
    onebuttonerase
    onebuttonerase --confirm --nomonitor";
