mod common;

mod tests {
    use smooth_dimmer::curve::correct;
    use smooth_dimmer::{
        Channel, ChannelConfig, Command, Engine, InvalidHandle, ModeFlags, OutputCapability, Phase,
        Request,
    };

    use super::common::{Drive, MockPin, dimmer, fade_ticks, pin, reset_board};

    #[test]
    fn test_claim_starts_off_and_goes_quiet() {
        let dimmer = dimmer();
        let led = dimmer.claim(2, ChannelConfig::new()).unwrap();

        assert_eq!(dimmer.level(led), Ok(0));
        assert_eq!(dimmer.is_idle(led), Ok(true));
        assert!(dimmer.fade_tick_armed());
        assert!(dimmer.pwm_tick_armed());

        dimmer.fade_tick();
        assert_eq!(pin(2), Some(Drive::Low));
        assert!(!dimmer.fade_tick_armed());
        assert!(!dimmer.pwm_tick_armed());
    }

    #[test]
    fn test_full_scale_fade_takes_pace_ms() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.request(led, 255, 1000, 0).unwrap();
        assert_eq!(dimmer.phase(led), Ok(Phase::Fading));

        fade_ticks(&dimmer, 500);
        let halfway = dimmer.level(led).unwrap();
        assert!((127..=128).contains(&halfway), "level after 500 ticks: {halfway}");

        fade_ticks(&dimmer, 500);
        assert_eq!(dimmer.level(led), Ok(255));
        assert_eq!(dimmer.is_idle(led), Ok(true));
    }

    #[test]
    fn test_fade_converges_within_pace() {
        let cases: [(u8, u8, u16); 6] = [
            (0, 100, 200),
            (0, 255, 100),
            (200, 10, 50),
            (10, 11, 300),
            (255, 0, 2000),
            (128, 64, 5),
        ];

        for (from, to, pace) in cases {
            let dimmer = dimmer();
            let led = dimmer.claim(9, ChannelConfig::new()).unwrap();
            dimmer.request(led, from, 0, 0).unwrap();
            dimmer.request(led, to, pace, 0).unwrap();

            let delta = u16::from(from.abs_diff(to));
            let bound = pace.max(delta) + 2;
            let mut ticks = 0;
            while dimmer.level(led).unwrap() != to {
                dimmer.fade_tick();
                ticks += 1;
                assert!(ticks <= bound, "{from} -> {to} over {pace} ms took more than {bound} ticks");
            }
            assert!(ticks + 2 >= delta.min(pace), "{from} -> {to} over {pace} ms finished early");
        }
    }

    #[test]
    fn test_fade_moves_one_level_at_a_time() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();
        dimmer.request(led, 40, 100, 0).unwrap();

        let mut previous = 0;
        for _ in 0..120 {
            dimmer.fade_tick();
            let level = dimmer.level(led).unwrap();
            assert!(level == previous || level == previous + 1);
            previous = level;
        }
        assert_eq!(previous, 40);
    }

    #[test]
    fn test_zero_pace_is_immediate() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.request(led, 180, 0, 0).unwrap();
        assert_eq!(dimmer.level(led), Ok(180));
        assert_eq!(dimmer.phase(led), Ok(Phase::Idle));
    }

    #[test]
    fn test_hold_after_reaching_target() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.request(led, 90, 0, 3).unwrap();
        assert_eq!(dimmer.phase(led), Ok(Phase::Holding));
        fade_ticks(&dimmer, 2);
        assert_eq!(dimmer.phase(led), Ok(Phase::Holding));
        dimmer.fade_tick();
        assert_eq!(dimmer.phase(led), Ok(Phase::Idle));
    }

    #[test]
    fn test_hardware_drive_writes_corrected_level() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.request(led, 128, 0, 0).unwrap();
        dimmer.fade_tick();
        assert_eq!(dimmer.corrected_level(led), Ok(correct(128)));
        assert_eq!(pin(9), Some(Drive::Pwm(correct(128))));
    }

    #[test]
    fn test_hardware_drive_without_correction() {
        let dimmer = dimmer();
        let led = dimmer.claim(10, ChannelConfig::new().without_correction()).unwrap();

        dimmer.request(led, 128, 0, 0).unwrap();
        dimmer.fade_tick();
        assert_eq!(dimmer.corrected_level(led), Ok(128));
        assert_eq!(pin(10), Some(Drive::Pwm(128)));
    }

    #[test]
    fn test_inverted_output() {
        let dimmer = dimmer();
        let led = dimmer.claim(5, ChannelConfig::new().inverted()).unwrap();

        dimmer.fade_tick();
        assert_eq!(pin(5), Some(Drive::High));

        dimmer.request(led, 128, 0, 0).unwrap();
        dimmer.fade_tick();
        assert_eq!(pin(5), Some(Drive::Pwm(255 - correct(128))));

        dimmer.request(led, 255, 0, 0).unwrap();
        dimmer.fade_tick();
        assert_eq!(pin(5), Some(Drive::Low));
    }

    #[test]
    fn test_extremes_switch_pin_directly() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.request(led, 255, 0, 0).unwrap();
        dimmer.fade_tick();
        assert_eq!(pin(9), Some(Drive::High));

        dimmer.request(led, 0, 0, 0).unwrap();
        dimmer.fade_tick();
        assert_eq!(pin(9), Some(Drive::Low));
    }

    #[test]
    fn test_nudge_moves_target_only() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();
        dimmer.fade_tick();
        assert!(!dimmer.fade_tick_armed());

        dimmer.nudge(led, 10).unwrap();
        assert_eq!(dimmer.target(led), Ok(10));
        assert_eq!(dimmer.level(led), Ok(0));
        assert!(dimmer.fade_tick_armed());

        fade_ticks(&dimmer, 10);
        assert_eq!(dimmer.level(led), Ok(10));

        dimmer.increase(led).unwrap();
        assert_eq!(dimmer.target(led), Ok(11));
        dimmer.decrease(led).unwrap();
        dimmer.decrease(led).unwrap();
        assert_eq!(dimmer.target(led), Ok(9));
    }

    #[test]
    fn test_nudge_saturates() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.nudge(led, -5).unwrap();
        assert_eq!(dimmer.target(led), Ok(0));

        dimmer.nudge(led, 300).unwrap();
        assert_eq!(dimmer.target(led), Ok(255));

        dimmer.nudge(led, i16::MAX).unwrap();
        assert_eq!(dimmer.target(led), Ok(255));

        dimmer.nudge(led, i16::MIN).unwrap();
        assert_eq!(dimmer.target(led), Ok(0));
    }

    #[test]
    fn test_nudge_during_hold_resumes_fading() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.request(led, 50, 0, 100).unwrap();
        dimmer.nudge(led, 5).unwrap();
        assert_eq!(dimmer.phase(led), Ok(Phase::Fading));

        fade_ticks(&dimmer, 5);
        assert_eq!(dimmer.level(led), Ok(55));
        assert_eq!(dimmer.phase(led), Ok(Phase::Holding));
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();
        dimmer.release(led).unwrap();

        assert_eq!(dimmer.request(led, 10, 0, 0), Err(InvalidHandle));
        assert_eq!(dimmer.request_now(led, 10, 0, 0), Err(InvalidHandle));
        assert_eq!(dimmer.nudge(led, 1), Err(InvalidHandle));
        assert_eq!(dimmer.level(led), Err(InvalidHandle));
    }

    #[test]
    fn test_engine_without_critical_section() {
        reset_board();
        let mut engine: Engine<MockPin, (), 2, 2> = Engine::new(());
        let led = engine.claim(3, ChannelConfig::new()).unwrap();

        engine.request(led, Command::new(20, 20, 0)).unwrap();
        for _ in 0..20 {
            engine.fade_tick();
        }
        assert_eq!(engine.channel(led).map(|channel| channel.level()), Ok(20));
        assert!(engine.gate().fade_armed());

        engine.fade_tick();
        assert!(!engine.gate().fade_armed());
        assert_eq!(pin(3), Some(Drive::Pwm(correct(20))));
    }

    #[test]
    fn test_enqueue_prepared_command() {
        let dimmer = dimmer();
        let led = dimmer.claim(9, ChannelConfig::new()).unwrap();

        dimmer.enqueue(led, Command::new(64, 0, 0)).unwrap();
        assert_eq!(dimmer.level(led), Ok(64));
    }

    #[test]
    fn test_channel_pacing_state() {
        reset_board();
        let output = MockPin::claim(9).unwrap();
        let mut channel: Channel<MockPin, 2> =
            Channel::new(output, ChannelConfig::new().inverted().software());
        assert_eq!(channel.output().resource_id(), 9);
        assert_eq!(
            channel.flags().bits(),
            ModeFlags::INVERTED.union(ModeFlags::SOFTWARE).bits()
        );

        // 1000 ms over 255 levels
        assert_eq!(channel.request(Command::new(255, 1000, 40)), Request::Applied);
        assert_eq!(channel.pace_increment(), 502);
        assert_eq!(channel.hold_remaining(), 40);
        assert_eq!(channel.phase(), Phase::Fading);
    }
}
